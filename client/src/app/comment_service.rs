//! Comment service
//!
//! Adds comments to posts. The feed itself only shows the comment count,
//! which arrives as a pushed update once the backend recounts.

use std::sync::Arc;

use super::feed_sync::FeedSynchronizer;
use crate::domain::entities::{CommentId, NewComment, NewNotification, PostId, ProfileId};
use crate::domain::ports::{CommentRepository, NotificationRepository, PostStore};
use crate::error::{DomainError, FeedError};

/// Service for commenting on posts as the signed-in viewer
pub struct CommentService<S, C, N>
where
    S: PostStore,
    C: CommentRepository,
    N: NotificationRepository,
{
    sync: FeedSynchronizer<S>,
    comments: Arc<C>,
    notifications: Arc<N>,
    viewer: Option<ProfileId>,
}

impl<S, C, N> CommentService<S, C, N>
where
    S: PostStore,
    C: CommentRepository,
    N: NotificationRepository,
{
    pub fn new(
        sync: FeedSynchronizer<S>,
        comments: Arc<C>,
        notifications: Arc<N>,
        viewer: Option<ProfileId>,
    ) -> Self {
        Self {
            sync,
            comments,
            notifications,
            viewer,
        }
    }

    /// Comment on `post_id`, or reply to `reply_to` under it.
    ///
    /// Commenting on someone else's post notifies its author; a failed
    /// notification does not undo the comment.
    pub async fn add_comment(
        &self,
        post_id: &PostId,
        content: &str,
        reply_to: Option<CommentId>,
    ) -> Result<(), FeedError> {
        let viewer = self.viewer.ok_or(FeedError::Unauthorized)?;
        let comment = NewComment::new(*post_id, viewer, content, reply_to)?;

        if let Err(e) = self.comments.create(&comment).await {
            tracing::error!("Failed to comment on post {}: {}", post_id, e);
            return Err(e.into());
        }

        match self.post_author(post_id).await {
            Ok(Some(author)) if author != viewer => {
                let notification = NewNotification::commented_on_post(author, viewer, *post_id);
                if let Err(e) = self.notifications.create(&notification).await {
                    tracing::warn!("Failed to notify {} about comment on {}: {}", author, post_id, e);
                }
            }
            Ok(Some(_)) => {}
            Ok(None) => tracing::debug!("No visible author for post {}", post_id),
            Err(e) => tracing::warn!("Could not look up author of post {}: {}", post_id, e),
        }
        Ok(())
    }

    /// Author from the loaded feed, falling back to the store
    async fn post_author(&self, post_id: &PostId) -> Result<Option<ProfileId>, DomainError> {
        if let Some(item) = self.sync.item(post_id).await {
            return Ok(Some(item.post.author.id));
        }
        let post = self.sync.store().fetch_post(post_id).await?;
        Ok(post.map(|post| post.author.id))
    }
}
