//! Post service
//!
//! Creates and deletes the viewer's own posts. The change feed reports both
//! to every open feed; the active feed is updated right away as well, and the
//! echo from the change feed is absorbed because inserts and deletes are
//! idempotent by identity.

use std::sync::Arc;

use super::feed_sync::FeedSynchronizer;
use crate::domain::entities::{NewPost, PostId, PostType, ProfileId};
use crate::domain::ports::{PostRepository, PostStore};
use crate::error::{DomainError, FeedError};

/// Service for writing posts as the signed-in viewer
pub struct PostService<S, P>
where
    S: PostStore,
    P: PostRepository,
{
    sync: FeedSynchronizer<S>,
    posts: Arc<P>,
    viewer: Option<ProfileId>,
}

impl<S, P> PostService<S, P>
where
    S: PostStore,
    P: PostRepository,
{
    pub fn new(sync: FeedSynchronizer<S>, posts: Arc<P>, viewer: Option<ProfileId>) -> Self {
        Self {
            sync,
            posts,
            viewer,
        }
    }

    /// Publish a post and show it in the active feed if it belongs there
    pub async fn create_post(
        &self,
        content: &str,
        post_type: PostType,
    ) -> Result<PostId, FeedError> {
        let viewer = self.viewer.ok_or(FeedError::Unauthorized)?;
        let post = NewPost::new(viewer, content, post_type)?;

        let id = self.posts.create(&post).await.map_err(|e| {
            tracing::error!("Failed to create {} post: {}", post_type, e);
            e
        })?;
        tracing::info!("Created post {}", id);

        match self.sync.store().fetch_post(&id).await {
            Ok(Some(created)) => {
                if self.sync.on_remote_insert(created).await {
                    self.sync.mark_liked(&[id], &[]).await;
                }
            }
            Ok(None) => tracing::debug!("Created post {} is not visible yet", id),
            Err(e) => tracing::warn!("Could not load created post {}: {}", id, e),
        }
        Ok(id)
    }

    /// Delete one of the viewer's posts and drop it from the active feed
    pub async fn delete_post(&self, id: &PostId) -> Result<(), FeedError> {
        let viewer = self.viewer.ok_or(FeedError::Unauthorized)?;
        if let Some(item) = self.sync.item(id).await {
            if item.post.author.id != viewer {
                return Err(DomainError::Unauthorized(format!(
                    "Post {} belongs to someone else",
                    id
                ))
                .into());
            }
        }

        if let Err(e) = self.posts.delete(id, &viewer).await {
            tracing::error!("Failed to delete post {}: {}", id, e);
            return Err(e.into());
        }
        tracing::info!("Deleted post {}", id);

        self.sync.on_remote_delete(id).await;
        Ok(())
    }
}
