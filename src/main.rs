use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use campusfeed::api::{GroupsApi, HttpApi};
use campusfeed::cache::EntityCache;
use campusfeed::feed::FeedView;
use campusfeed::groups::GroupIndex;
use campusfeed::notify::TracingNotifier;
use campusfeed::poller::ConversationPoller;
use campusfeed::Api;

/// Headless demo client: prints a feed and group snapshot, then (with a
/// token) polls conversations until interrupted.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds to reduce manual setup overhead.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    validate_env_vars();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let base_url = std::env::var("CAMPUSFEED_API_URL")?;
    let token = std::env::var("CAMPUSFEED_TOKEN").ok();

    let mut api = HttpApi::new(&base_url);
    if let Some(t) = &token {
        api = api.with_token(t);
    }
    let api: Arc<dyn Api> = Arc::new(api);
    let cache = Arc::new(EntityCache::new());
    let notifier = Arc::new(TracingNotifier);

    info!("Fetching feed from {base_url}");
    let feed = FeedView::new(cache.clone(), api.clone(), notifier.clone());
    feed.refresh().await;
    for post in feed.posts() {
        println!(
            "[{}] {} by {} (+{} / -{} / {} comments) -> {}",
            post.category.as_str(),
            post.title,
            post.anonymous_tag,
            post.upvotes.len(),
            post.downvotes.len(),
            post.comment_count,
            post.target_group_name,
        );
    }

    match api.list_groups().await {
        Ok(groups) => {
            let index = GroupIndex::partition(groups);
            for (section, bucket) in [
                ("Departments", &index.departments),
                ("Houses", &index.houses),
                ("Clubs", &index.clubs),
            ] {
                println!("== {section} ==");
                for g in bucket {
                    let flag = if g.low_confidence() { " (low data)" } else { "" };
                    println!(
                        "  {}: {:.1} {}{} ({} posts)",
                        g.group_name,
                        g.performance_score,
                        g.band().label(),
                        flag,
                        g.total_posts,
                    );
                }
            }
        }
        Err(e) => eprintln!("groups unavailable: {e}"),
    }

    if token.is_none() {
        info!("No CAMPUSFEED_TOKEN set; skipping conversation polling");
        return Ok(());
    }

    let poller = Arc::new(ConversationPoller::new(cache, api, notifier));
    let handle = poller.start();
    info!("Polling conversations every {:?} (ctrl-c to stop)", campusfeed::POLL_INTERVAL);
    tokio::signal::ctrl_c().await?;
    handle.stop();
    info!("Poller stopped");
    Ok(())
}

/// Validate that required environment variables are set
fn validate_env_vars() {
    if std::env::var("CAMPUSFEED_API_URL").is_err() {
        eprintln!("Missing required environment variable CAMPUSFEED_API_URL");
        eprintln!("Set it to the backend base URL including the /api prefix");
        std::process::exit(1);
    }
    if std::env::var("CAMPUSFEED_TOKEN").is_err() {
        eprintln!("Warning: CAMPUSFEED_TOKEN not set; authenticated endpoints will be skipped");
    }
}
