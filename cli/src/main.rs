//! Verse terminal client
//!
//! Activates one feed view against the configured backend, prints it, and
//! keeps printing as live changes arrive until Ctrl-C.

mod render;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use verse_client::{
    CommentService, Config, FeedSession, FeedStatus, FeedView, LikeService, PostId, PostService,
    PostType, RealtimeClient, RestClient, RestCommentRepository, RestLikeRepository,
    RestNotificationRepository, RestPostStore,
};

#[derive(Debug, Parser)]
#[command(name = "verse", version, about = "Follow a Verse feed from the terminal")]
struct Args {
    /// Feed view: home, following, trending or featured
    #[arg(long, default_value = "home")]
    view: FeedView,

    /// Number of pages to load before following live changes
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Toggle your like on a loaded post (requires VERSE_USER_ID)
    #[arg(long)]
    like: Option<PostId>,

    /// Publish a post with this text (requires VERSE_USER_ID)
    #[arg(long)]
    post: Option<String>,

    /// Type of the published post
    #[arg(long, default_value = "thought")]
    post_type: PostType,

    /// Delete one of your posts
    #[arg(long)]
    delete: Option<PostId>,

    /// Comment on a post; the text comes from --message
    #[arg(long, requires = "message")]
    comment: Option<PostId>,

    /// Comment text
    #[arg(long)]
    message: Option<String>,

    /// Print the feed once and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the feed
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,verse_client=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Opening {} feed from {}", args.view, config.backend_url);

    let rest = Arc::new(RestClient::new(&config).context("Failed to build REST client")?);
    let store = Arc::new(RestPostStore::new(rest.clone()));
    let changes = Arc::new(RealtimeClient::new(&config).context("Invalid realtime endpoint")?);

    let mut session = FeedSession::new(store, changes, config.user_id);
    session
        .activate(args.view)
        .await
        .with_context(|| format!("Failed to load the {} feed", args.view))?;

    for _ in 1..args.pages {
        if !session.sync().load_more().await? {
            break;
        }
    }

    let notifications = Arc::new(RestNotificationRepository::new(rest.clone()));
    let likes = LikeService::new(
        session.sync().clone(),
        Arc::new(RestLikeRepository::new(rest.clone())),
        notifications.clone(),
        config.user_id,
    );
    if config.signed_in() {
        match likes.sync_liked_flags().await {
            Ok(count) => tracing::debug!("{} loaded posts already liked", count),
            Err(e) => tracing::warn!("Could not load like flags: {}", e),
        }
    }
    if let Some(post_id) = args.like {
        let liked = likes
            .toggle_like(&post_id)
            .await
            .with_context(|| format!("Failed to toggle like on {}", post_id))?;
        tracing::info!("{} post {}", if liked { "Liked" } else { "Unliked" }, post_id);
    }

    let posts = PostService::new(
        session.sync().clone(),
        session.sync().store().clone(),
        config.user_id,
    );
    if let Some(content) = &args.post {
        let id = posts
            .create_post(content, args.post_type)
            .await
            .context("Failed to publish post")?;
        tracing::info!("Published post {}", id);
    }
    if let Some(post_id) = args.delete {
        posts
            .delete_post(&post_id)
            .await
            .with_context(|| format!("Failed to delete {}", post_id))?;
    }
    if let (Some(post_id), Some(message)) = (args.comment, &args.message) {
        let comments = CommentService::new(
            session.sync().clone(),
            Arc::new(RestCommentRepository::new(rest)),
            notifications,
            config.user_id,
        );
        comments
            .add_comment(&post_id, message, None)
            .await
            .with_context(|| format!("Failed to comment on {}", post_id))?;
        tracing::info!("Commented on post {}", post_id);
    }

    print!("{}", render::render_feed(args.view, &session.sync().snapshot()));

    if !args.once {
        follow(&session, args.view).await;
    }

    session.deactivate().await;
    Ok(())
}

/// Print the feed on every settled state change until Ctrl-C
async fn follow<S, C>(session: &FeedSession<S, C>, view: FeedView)
where
    S: verse_client::domain::ports::PostStore + 'static,
    C: verse_client::domain::ports::ChangeFeed,
{
    let mut updates = session.sync().subscribe();
    updates.borrow_and_update();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.status.is_loading() {
                    tracing::info!("{} feed: {}", view, render::render_status(&state));
                    continue;
                }
                if state.status != FeedStatus::Deactivated {
                    print!("{}", render::render_feed(view, &state));
                }
            }
        }
    }
}
