//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture creates a valid, visible post or profile that tests can
//! customize.

use chrono::{Duration, Utc};

use crate::domain::entities::{Post, PostId, PostType, ProfileId, ProfileSummary};

/// Create a test author below every view threshold
pub fn test_profile() -> ProfileSummary {
    let id = ProfileId::new();
    let short = id.0.simple().to_string();
    ProfileSummary {
        id,
        username: format!("writer-{}", &short[..8]),
        display_name: "Test Writer".to_string(),
        avatar_url: None,
        post_count: 2,
        follower_count: 3,
        is_admin: false,
    }
}

/// Create a test post by a fresh author
pub fn test_post() -> Post {
    test_post_by(&test_profile())
}

/// Create a test post by a specific author
pub fn test_post_by(author: &ProfileSummary) -> Post {
    Post {
        id: PostId::new(),
        author: author.clone(),
        content: "the quiet hour before the rain".to_string(),
        post_type: PostType::Thought,
        like_count: 0,
        comment_count: 0,
        is_hidden: false,
        created_at: Utc::now(),
    }
}

/// Create a test post with a specific like count
pub fn test_post_with_likes(like_count: i64) -> Post {
    Post {
        like_count,
        ..test_post()
    }
}

/// Create `count` posts ordered newest first, one minute apart
pub fn test_posts(count: usize) -> Vec<Post> {
    let base = Utc::now();
    (0..count)
        .map(|i| Post {
            content: format!("post number {}", i),
            created_at: base - Duration::minutes(i as i64),
            ..test_post()
        })
        .collect()
}
