//! Like and notification inserts
//!
//! Rows the client writes when a user likes or comments on a post.

use serde::{Deserialize, Serialize};

use super::{PostId, ProfileId};

/// A like by `user_id` on `post_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NewLike {
    pub post_id: PostId,
    pub user_id: ProfileId,
}

/// Kind of notification shown in the recipient's panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Like => write!(f, "like"),
            NotificationKind::Comment => write!(f, "comment"),
            NotificationKind::Follow => write!(f, "follow"),
        }
    }
}

/// Notification for `user_id` about something `actor_id` did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNotification {
    pub user_id: ProfileId,
    pub actor_id: ProfileId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
}

impl NewNotification {
    pub fn liked_post(recipient: ProfileId, actor: ProfileId, post_id: PostId) -> Self {
        Self {
            user_id: recipient,
            actor_id: actor,
            kind: NotificationKind::Like,
            message: "liked your post".to_string(),
            post_id: Some(post_id),
        }
    }

    pub fn commented_on_post(recipient: ProfileId, actor: ProfileId, post_id: PostId) -> Self {
        Self {
            user_id: recipient,
            actor_id: actor,
            kind: NotificationKind::Comment,
            message: "commented on your post".to_string(),
            post_id: Some(post_id),
        }
    }
}
