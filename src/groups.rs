use once_cell::sync::Lazy;

use crate::models::{GroupPerformance, GroupType};

/// Groups with fewer posts than this carry low-confidence scores and are
/// flagged (not hidden) on the performance page.
pub const LOW_CONFIDENCE_MIN_POSTS: i64 = 5;

impl GroupPerformance {
    pub fn low_confidence(&self) -> bool {
        self.total_posts < LOW_CONFIDENCE_MIN_POSTS
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_score(self.performance_score)
    }
}

/// Display banding for a 0-100 performance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 70.0 {
            ScoreBand::Excellent
        } else if score >= 50.0 {
            ScoreBand::Good
        } else {
            ScoreBand::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Flat group-performance records partitioned into the three display
/// sections. Records with an unrecognized group type are dropped, not
/// errored: display is purely categorical.
#[derive(Debug, Default)]
pub struct GroupIndex {
    pub departments: Vec<GroupPerformance>,
    pub clubs: Vec<GroupPerformance>,
    pub houses: Vec<GroupPerformance>,
}

impl GroupIndex {
    pub fn partition(records: Vec<GroupPerformance>) -> Self {
        let mut index = GroupIndex::default();
        for record in records {
            match record.group_type {
                GroupType::Department => index.departments.push(record),
                GroupType::Club => index.clubs.push(record),
                GroupType::House => index.houses.push(record),
                GroupType::Unknown => {}
            }
        }
        index
    }
}

/// The campus directory the post form and filters offer.
pub static KNOWN_GROUPS: Lazy<Vec<(GroupType, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        (
            GroupType::Department,
            &["Physics", "Chemistry", "Computer", "Maths", "Kitchen", "School Management Team"][..],
        ),
        (
            GroupType::Club,
            &[
                "ARC Club",
                "Maths Club",
                "Science Club",
                "Leo Club",
                "Interact Club",
                "Social Service Club",
                "YRC Club",
            ][..],
        ),
        (
            GroupType::House,
            &["Gaurishankhar House", "Choyu House", "Byasrishi House", "Ratnachuli House"][..],
        ),
    ]
});

/// Names offered for one group type.
pub fn group_names(group_type: GroupType) -> &'static [&'static str] {
    KNOWN_GROUPS
        .iter()
        .find(|(t, _)| *t == group_type)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(group_type: GroupType, name: &str, score: f64, total: i64) -> GroupPerformance {
        GroupPerformance {
            group_type,
            group_name: name.into(),
            performance_score: score,
            appreciation_count: 0,
            suggestion_count: 0,
            complaint_count: 0,
            total_posts: total,
        }
    }

    #[test]
    fn partition_buckets_and_drops_unknown() {
        let index = GroupIndex::partition(vec![
            record(GroupType::Department, "Physics", 80.0, 10),
            record(GroupType::House, "Choyu House", 55.0, 7),
            record(GroupType::Unknown, "Cafeteria", 40.0, 2),
            record(GroupType::Club, "Leo Club", 62.0, 3),
        ]);
        assert_eq!(index.departments.len(), 1);
        assert_eq!(index.houses.len(), 1);
        assert_eq!(index.clubs.len(), 1);
    }

    #[test]
    fn low_confidence_boundary() {
        assert!(record(GroupType::Club, "Leo Club", 50.0, 4).low_confidence());
        assert!(!record(GroupType::Club, "Leo Club", 50.0, 5).low_confidence());
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::for_score(70.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_score(69.9), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(49.9), ScoreBand::NeedsImprovement);
    }

    #[test]
    fn directory_covers_all_types() {
        assert!(group_names(GroupType::Department).contains(&"Physics"));
        assert!(group_names(GroupType::House).contains(&"Ratnachuli House"));
        assert!(group_names(GroupType::Unknown).is_empty());
    }
}
