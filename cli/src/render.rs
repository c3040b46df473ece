//! Feed renderer
//!
//! Renders feed state as plain text for the terminal.

use verse_client::{FeedItem, FeedState, FeedStatus, FeedView};

/// Render the whole feed
pub fn render_feed(view: FeedView, state: &FeedState) -> String {
    let mut buf = String::new();

    buf.push_str(&format!("== {} ==\n", view.title()));
    buf.push_str(&render_status(state));
    buf.push('\n');

    if state.is_empty() {
        buf.push_str("\n  (no posts yet)\n");
        return buf;
    }

    for (index, item) in state.items.iter().enumerate() {
        buf.push('\n');
        buf.push_str(&render_item(index + 1, item));
    }

    if state.has_more {
        buf.push_str("\n  ... more available\n");
    }
    buf
}

/// One-line summary of the feed status
pub fn render_status(state: &FeedState) -> String {
    match &state.status {
        FeedStatus::Idle => "idle".to_string(),
        FeedStatus::Loading => "loading...".to_string(),
        FeedStatus::LoadingMore(page) => {
            format!("{} posts, loading page {}...", state.len(), page + 1)
        }
        FeedStatus::Ready => format!("{} posts", state.len()),
        FeedStatus::Error(message) => format!("{} posts, last load failed: {}", state.len(), message),
        FeedStatus::Deactivated => "closed".to_string(),
    }
}

fn render_item(position: usize, item: &FeedItem) -> String {
    let post = &item.post;
    let heart = if item.liked_by_me { "♥" } else { "♡" };

    let mut buf = format!(
        "{:>3}. [{}] {} ({})\n",
        position,
        post.post_type.label(),
        post.author.handle(),
        post.created_at.format("%Y-%m-%d %H:%M"),
    );
    for line in post.content.lines() {
        buf.push_str(&format!("     {}\n", line));
    }
    buf.push_str(&format!(
        "     {} {}  💬 {}  id {}\n",
        heart, post.like_count, post.comment_count, post.id
    ));
    buf
}
