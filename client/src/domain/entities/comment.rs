//! Comment domain entity
//!
//! Comments are written by the client and counted on the post row; the feed
//! only sees them through `comment_count`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PostId, ProfileId};
use crate::error::DomainError;

/// Unique identifier for a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CommentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A comment on `post_id`, optionally replying to another comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: ProfileId,
    pub content: String,
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    pub fn new(
        post_id: PostId,
        author: ProfileId,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::Validation("Comment is empty".to_string()));
        }
        Ok(Self {
            post_id,
            user_id: author,
            content: content.to_string(),
            parent_id,
        })
    }
}
