//! Profile domain entity
//!
//! The author summary embedded in every feed post.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub Uuid);

impl ProfileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ProfileId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author fields shown next to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: ProfileId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub post_count: i64,
    pub follower_count: i64,
    pub is_admin: bool,
}

impl ProfileSummary {
    /// Stand-in used when a row arrives without its embedded profile
    pub fn placeholder(id: ProfileId) -> Self {
        Self {
            id,
            username: "unknown".to_string(),
            display_name: "Unknown".to_string(),
            avatar_url: None,
            post_count: 0,
            follower_count: 0,
            is_admin: false,
        }
    }

    /// Handle as rendered in the feed, e.g. `@ada`
    pub fn handle(&self) -> String {
        format!("@{}", self.username)
    }
}
