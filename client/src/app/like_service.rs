//! Like service
//!
//! Toggles likes with optimistic feedback: the feed updates immediately, the
//! mutation is sent afterwards, and the optimistic change is reverted if the
//! backend rejects it.

use std::sync::Arc;

use super::feed_sync::FeedSynchronizer;
use crate::domain::entities::{NewLike, NewNotification, PostId, ProfileId};
use crate::domain::ports::{LikeRepository, NotificationRepository, PostStore};
use crate::error::{DomainError, FeedError};

/// Service for liking and unliking posts in the active feed
pub struct LikeService<S, L, N>
where
    S: PostStore,
    L: LikeRepository,
    N: NotificationRepository,
{
    sync: FeedSynchronizer<S>,
    likes: Arc<L>,
    notifications: Arc<N>,
    viewer: Option<ProfileId>,
}

impl<S, L, N> LikeService<S, L, N>
where
    S: PostStore,
    L: LikeRepository,
    N: NotificationRepository,
{
    pub fn new(
        sync: FeedSynchronizer<S>,
        likes: Arc<L>,
        notifications: Arc<N>,
        viewer: Option<ProfileId>,
    ) -> Self {
        Self {
            sync,
            likes,
            notifications,
            viewer,
        }
    }

    /// Flip the viewer's like on `post_id`. Returns the new liked state.
    ///
    /// Liking someone else's post also notifies its author; a failed
    /// notification does not undo the like.
    pub async fn toggle_like(&self, post_id: &PostId) -> Result<bool, FeedError> {
        let viewer = self.viewer.ok_or(FeedError::Unauthorized)?;
        let item = self.sync.item(post_id).await.ok_or_else(|| {
            DomainError::NotFound(format!("Post {} is not in the feed", post_id))
        })?;

        let liked_before = if item.like_checked {
            item.liked_by_me
        } else {
            self.check_liked(&viewer, post_id).await?
        };

        let liked = !liked_before;
        let Some(delta) = self.sync.apply_optimistic_like(post_id, liked).await else {
            // Removed or toggled concurrently; nothing to send
            return Ok(liked_before);
        };

        let like = NewLike {
            post_id: *post_id,
            user_id: viewer,
        };
        let result = if liked {
            self.likes.like(&like).await
        } else {
            self.likes.unlike(&like).await
        };

        if let Err(e) = result {
            tracing::error!("Failed to update like on post {}: {}", post_id, e);
            self.sync.revert_optimistic_like(&delta).await;
            return Err(e.into());
        }

        let author = item.post.author.id;
        if liked && author != viewer {
            let notification = NewNotification::liked_post(author, viewer, *post_id);
            if let Err(e) = self.notifications.create(&notification).await {
                tracing::warn!("Failed to notify {} about like on {}: {}", author, post_id, e);
            }
        }

        Ok(liked)
    }

    /// Check the like status of loaded posts not checked yet, so it is
    /// safe to call after every page. Returns how many of them are liked.
    pub async fn sync_liked_flags(&self) -> Result<usize, FeedError> {
        let Some(viewer) = self.viewer else {
            return Ok(0);
        };
        let ids = self.sync.unchecked_like_ids().await;
        if ids.is_empty() {
            return Ok(0);
        }

        let liked = self.likes.liked_among(&viewer, &ids).await?;
        self.sync.mark_liked(&ids, &liked).await;
        Ok(liked.len())
    }

    async fn check_liked(&self, viewer: &ProfileId, post_id: &PostId) -> Result<bool, FeedError> {
        let ids = [*post_id];
        let liked = self.likes.liked_among(viewer, &ids).await?;
        self.sync.mark_liked(&ids, &liked).await;
        Ok(liked.contains(post_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{FeedView, NotificationKind};
    use crate::test_utils::{
        test_post_by, test_post_with_likes, test_posts, test_profile, InMemoryLikeRepository,
        InMemoryNotificationRepository, InMemoryPostStore,
    };

    type Service =
        LikeService<InMemoryPostStore, InMemoryLikeRepository, InMemoryNotificationRepository>;

    struct Harness {
        service: Service,
        sync: FeedSynchronizer<InMemoryPostStore>,
        likes: Arc<InMemoryLikeRepository>,
        notifications: Arc<InMemoryNotificationRepository>,
    }

    async fn harness(store: InMemoryPostStore, viewer: Option<ProfileId>) -> Harness {
        let sync = FeedSynchronizer::new(Arc::new(store));
        sync.activate(FeedView::Home.into()).await;
        sync.load_page(0).await.unwrap();

        let likes = Arc::new(InMemoryLikeRepository::new());
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        Harness {
            service: LikeService::new(sync.clone(), likes.clone(), notifications.clone(), viewer),
            sync,
            likes,
            notifications,
        }
    }

    #[tokio::test]
    async fn like_updates_feed_and_notifies_author() {
        let post = test_post_with_likes(2);
        let viewer = ProfileId::new();
        let h = harness(InMemoryPostStore::new().with_posts(vec![post.clone()]), Some(viewer)).await;

        assert!(h.service.toggle_like(&post.id).await.unwrap());

        let item = h.sync.item(&post.id).await.unwrap();
        assert!(item.liked_by_me);
        assert_eq!(item.post.like_count, 3);
        assert!(h.likes.contains(&viewer, &post.id));

        let sent = h.notifications.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, post.author.id);
        assert_eq!(sent[0].actor_id, viewer);
        assert_eq!(sent[0].kind, NotificationKind::Like);
    }

    #[tokio::test]
    async fn second_toggle_unlikes() {
        let post = test_post_with_likes(2);
        let viewer = ProfileId::new();
        let h = harness(InMemoryPostStore::new().with_posts(vec![post.clone()]), Some(viewer)).await;

        h.service.toggle_like(&post.id).await.unwrap();
        assert!(!h.service.toggle_like(&post.id).await.unwrap());

        let item = h.sync.item(&post.id).await.unwrap();
        assert!(!item.liked_by_me);
        assert_eq!(item.post.like_count, 2);
        assert!(!h.likes.contains(&viewer, &post.id));
        assert_eq!(h.notifications.sent().len(), 1);
    }

    #[tokio::test]
    async fn failed_mutation_reverts_optimistic_like() {
        let post = test_post_with_likes(5);
        let h = harness(
            InMemoryPostStore::new().with_posts(vec![post.clone()]),
            Some(ProfileId::new()),
        )
        .await;
        h.likes.set_failing(true);

        let err = h.service.toggle_like(&post.id).await.unwrap_err();
        assert!(matches!(err, FeedError::Domain(DomainError::Backend(_))));

        let item = h.sync.item(&post.id).await.unwrap();
        assert!(!item.liked_by_me);
        assert_eq!(item.post.like_count, 5);
        assert!(h.notifications.sent().is_empty());
    }

    #[tokio::test]
    async fn liking_own_post_sends_no_notification() {
        let me = test_profile();
        let post = test_post_by(&me);
        let h = harness(InMemoryPostStore::new().with_posts(vec![post.clone()]), Some(me.id)).await;

        h.service.toggle_like(&post.id).await.unwrap();
        assert!(h.notifications.sent().is_empty());
    }

    #[tokio::test]
    async fn notification_failure_keeps_like() {
        let post = test_post_with_likes(0);
        let h = harness(
            InMemoryPostStore::new().with_posts(vec![post.clone()]),
            Some(ProfileId::new()),
        )
        .await;
        h.notifications.set_failing(true);

        assert!(h.service.toggle_like(&post.id).await.unwrap());
        assert_eq!(h.sync.item(&post.id).await.unwrap().post.like_count, 1);
    }

    #[tokio::test]
    async fn signed_out_viewer_cannot_like() {
        let post = test_post_with_likes(1);
        let h = harness(InMemoryPostStore::new().with_posts(vec![post.clone()]), None).await;

        let err = h.service.toggle_like(&post.id).await.unwrap_err();
        assert!(matches!(err, FeedError::Unauthorized));
        assert_eq!(h.sync.item(&post.id).await.unwrap().post.like_count, 1);
    }

    #[tokio::test]
    async fn unknown_post_is_not_found() {
        let h = harness(InMemoryPostStore::new(), Some(ProfileId::new())).await;
        let err = h.service.toggle_like(&PostId::new()).await.unwrap_err();
        assert!(matches!(err, FeedError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn post_loaded_after_seeding_is_checked_before_toggle() {
        let posts = test_posts(12);
        let viewer = ProfileId::new();
        let h = harness(InMemoryPostStore::new().with_posts(posts.clone()), Some(viewer)).await;
        h.likes.seed(viewer, posts[11].id);
        h.service.sync_liked_flags().await.unwrap();

        h.sync.load_more().await.unwrap();
        let before = h.sync.item(&posts[11].id).await.unwrap().post.like_count;

        assert!(!h.service.toggle_like(&posts[11].id).await.unwrap());
        assert!(!h.likes.contains(&viewer, &posts[11].id));
        assert!(h.notifications.sent().is_empty());
        let item = h.sync.item(&posts[11].id).await.unwrap();
        assert!(!item.liked_by_me);
        assert_eq!(item.post.like_count, before);
    }

    #[tokio::test]
    async fn seeding_only_checks_new_posts() {
        let posts = test_posts(12);
        let viewer = ProfileId::new();
        let h = harness(InMemoryPostStore::new().with_posts(posts.clone()), Some(viewer)).await;
        h.likes.seed(viewer, posts[0].id);
        h.likes.seed(viewer, posts[10].id);

        assert_eq!(h.service.sync_liked_flags().await.unwrap(), 1);
        h.sync.load_more().await.unwrap();
        assert_eq!(h.service.sync_liked_flags().await.unwrap(), 1);
        assert_eq!(h.service.sync_liked_flags().await.unwrap(), 0);

        assert!(h.sync.item(&posts[0].id).await.unwrap().liked_by_me);
        assert!(h.sync.item(&posts[10].id).await.unwrap().liked_by_me);
        assert!(!h.sync.item(&posts[11].id).await.unwrap().liked_by_me);
    }

    #[tokio::test]
    async fn liked_flags_are_seeded_from_backend() {
        let liked = test_post_with_likes(4);
        let other = test_post_with_likes(1);
        let viewer = ProfileId::new();
        let h = harness(
            InMemoryPostStore::new().with_page(0, vec![liked.clone(), other.clone()]),
            Some(viewer),
        )
        .await;
        h.likes.seed(viewer, liked.id);

        assert_eq!(h.service.sync_liked_flags().await.unwrap(), 1);
        assert!(h.sync.item(&liked.id).await.unwrap().liked_by_me);
        assert!(!h.sync.item(&other.id).await.unwrap().liked_by_me);
        assert_eq!(h.sync.item(&liked.id).await.unwrap().post.like_count, 4);
    }
}
