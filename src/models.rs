use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Backend ids are opaque UUID strings
pub type Id = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Complaint,
    Suggestion,
    Appreciation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupType {
    Department,
    Club,
    House,
    // display is purely categorical, so anything the server adds later is
    // carried but never bucketed
    #[serde(other)]
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Complaint => "Complaint",
            Category::Suggestion => "Suggestion",
            Category::Appreciation => "Appreciation",
        }
    }
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Department => "Department",
            GroupType::Club => "Club",
            GroupType::House => "House",
            GroupType::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            VoteKind::Upvote => "upvote",
            VoteKind::Downvote => "downvote",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub target_group_type: GroupType,
    pub target_group_name: String,
    pub anonymous_tag: String,
    #[serde(default)]
    pub upvotes: Vec<Id>,
    #[serde(default)]
    pub downvotes: Vec<Id>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comment_count: i64, // advisory display count, may drift from the loaded list
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub target_group_type: GroupType,
    pub target_group_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub post_id: Id,
    pub anonymous_tag: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Id,
    pub participant1_id: Id,
    pub participant2_id: Id,
    #[serde(default)]
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// The participant that is not `me`. The pair is unordered but stored
    /// positionally by the backend.
    pub fn other_participant(&self, me: &str) -> &str {
        if self.participant1_id == me {
            &self.participant2_id
        } else {
            &self.participant1_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Id,
    pub conversation_id: Id,
    pub sender_id: Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub content: String,
    pub conversation_id: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPerformance {
    pub group_type: GroupType,
    pub group_name: String,
    pub performance_score: f64,
    pub appreciation_count: i64,
    pub suggestion_count: i64,
    pub complaint_count: i64,
    pub total_posts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub anonymous_tag: String,
    pub role: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Server response to an upvote/downvote request. The confirmed sets are the
/// only refresh path allowed to replace cached vote membership wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
    #[serde(default)]
    pub upvotes: Vec<Id>,
    #[serde(default)]
    pub downvotes: Vec<Id>,
}

/// Optional query-string filters for the feed.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub category: Option<Category>,
    pub target_group_type: Option<GroupType>,
    pub target_group_name: Option<String>,
}
