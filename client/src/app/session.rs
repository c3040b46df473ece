//! Feed session
//!
//! Ties a feed view to its change subscription. Activating a view tears down
//! the previous view's subscription before the next one is opened, so events
//! are never delivered twice, and tags the pump with the activation epoch so
//! late events cannot leak into the new view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::coalescer::{CoalescerHandle, RefreshCoalescer, REFRESH_COALESCE_WINDOW};
use super::feed_sync::{FeedSynchronizer, RemoteChange};
use crate::domain::entities::{FeedView, ProfileId, ResolvedView};
use crate::domain::ports::{ChangeEvent, ChangeFeed, ChangeTable, PostStore, SubscriptionHandle};
use crate::error::FeedError;

const SUBSCRIBED_TABLES: [ChangeTable; 2] = [ChangeTable::Posts, ChangeTable::Likes];

/// Resources owned by the active view
struct ActiveView {
    view: FeedView,
    subscription: Option<SubscriptionHandle>,
    pump: Option<JoinHandle<()>>,
    _coalescer: RefreshCoalescer,
}

impl ActiveView {
    fn close(mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
    }
}

/// Drives one feed view at a time
pub struct FeedSession<S, C>
where
    S: PostStore + 'static,
    C: ChangeFeed,
{
    sync: FeedSynchronizer<S>,
    changes: Arc<C>,
    viewer: Option<ProfileId>,
    coalesce_window: Duration,
    active: Option<ActiveView>,
}

impl<S, C> FeedSession<S, C>
where
    S: PostStore + 'static,
    C: ChangeFeed,
{
    pub fn new(store: Arc<S>, changes: Arc<C>, viewer: Option<ProfileId>) -> Self {
        Self {
            sync: FeedSynchronizer::new(store),
            changes,
            viewer,
            coalesce_window: REFRESH_COALESCE_WINDOW,
            active: None,
        }
    }

    pub fn sync(&self) -> &FeedSynchronizer<S> {
        &self.sync
    }

    pub fn active_view(&self) -> Option<FeedView> {
        self.active.as_ref().map(|active| active.view)
    }

    /// Switch to `view`: close the old subscription, reset the feed, open a
    /// new subscription and load the first page.
    ///
    /// A failed subscription leaves the feed usable without live updates.
    pub async fn activate(&mut self, view: FeedView) -> Result<(), FeedError> {
        self.deactivate().await;

        let resolved = self.resolve(view).await;
        let epoch = self.sync.activate(resolved).await;

        let coalescer = {
            let sync = self.sync.clone();
            RefreshCoalescer::spawn(self.coalesce_window, move || {
                let sync = sync.clone();
                async move {
                    if let Err(e) = sync.reload_if_idle().await {
                        tracing::debug!("Coalesced refresh did not apply: {}", e);
                    }
                }
            })
        };

        let topic = format!("feed-{}", view);
        let (subscription, pump) = match self.changes.subscribe(&topic, &SUBSCRIBED_TABLES).await {
            Ok(subscription) => {
                let (handle, events) = subscription.split();
                let pump = tokio::spawn(pump_events(
                    self.sync.clone(),
                    epoch,
                    events,
                    coalescer.handle(),
                ));
                (Some(handle), Some(pump))
            }
            Err(e) => {
                tracing::warn!("Live updates unavailable for {} feed: {}", view, e);
                (None, None)
            }
        };

        self.active = Some(ActiveView {
            view,
            subscription,
            pump,
            _coalescer: coalescer,
        });

        match self.sync.load_page(0).await {
            // A coalesced reload already replaced this load
            Err(FeedError::Stale) => Ok(()),
            other => other,
        }
    }

    /// Close the subscription and mark the feed deactivated
    pub async fn deactivate(&mut self) {
        if let Some(active) = self.active.take() {
            active.close();
            self.sync.deactivate().await;
        }
    }

    async fn resolve(&self, view: FeedView) -> ResolvedView {
        if view != FeedView::Following {
            return view.into();
        }
        let Some(viewer) = self.viewer else {
            return view.into();
        };

        let followed = match self.sync.store().following_ids(&viewer).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Failed to load followed authors for {}: {}", viewer, e);
                Vec::new()
            }
        };
        ResolvedView::new(view, followed)
    }
}

impl<S, C> Drop for FeedSession<S, C>
where
    S: PostStore + 'static,
    C: ChangeFeed,
{
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.close();
        }
    }
}

/// Forward change events for `epoch` into the synchronizer
async fn pump_events<S: PostStore + 'static>(
    sync: FeedSynchronizer<S>,
    epoch: u64,
    mut events: mpsc::Receiver<ChangeEvent>,
    refresh: CoalescerHandle,
) {
    while let Some(event) = events.recv().await {
        match event {
            ChangeEvent::PostInserted(id) => match sync.store().fetch_post(&id).await {
                Ok(Some(post)) => {
                    sync.apply_remote_at(epoch, RemoteChange::Insert(post)).await;
                }
                Ok(None) => tracing::debug!("Inserted post {} is not visible", id),
                Err(e) => tracing::warn!("Dropping insert of post {}: {}", id, e),
            },
            ChangeEvent::PostUpdated(patch) => {
                sync.apply_remote_at(epoch, RemoteChange::Update(patch)).await;
            }
            ChangeEvent::PostDeleted(id) => {
                sync.apply_remote_at(epoch, RemoteChange::Delete(id)).await;
            }
            ChangeEvent::LikesChanged => refresh.trigger(),
        }
    }
    tracing::debug!("Change feed for epoch {} ended", epoch);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FeedStatus;
    use crate::domain::entities::{AuthorFilter, PostPatch, ProfileId};
    use crate::test_utils::{
        test_post, test_post_by, test_posts, test_profile, InMemoryPostStore, MockChangeFeed,
    };
    use crate::FeedState;
    use tokio::sync::watch;

    const WAIT: Duration = Duration::from_secs(2);

    fn session(
        store: InMemoryPostStore,
        viewer: Option<ProfileId>,
    ) -> (
        FeedSession<InMemoryPostStore, MockChangeFeed>,
        Arc<InMemoryPostStore>,
        Arc<MockChangeFeed>,
    ) {
        let store = Arc::new(store);
        let feed = Arc::new(MockChangeFeed::new());
        (
            FeedSession::new(store.clone(), feed.clone(), viewer),
            store,
            feed,
        )
    }

    async fn wait_for(
        updates: &mut watch::Receiver<FeedState>,
        predicate: impl FnMut(&FeedState) -> bool,
    ) {
        tokio::time::timeout(WAIT, updates.wait_for(predicate))
            .await
            .expect("feed never reached the expected state")
            .expect("feed synchronizer dropped");
    }

    #[tokio::test]
    async fn activation_loads_first_page_and_subscribes() {
        let (mut session, _store, feed) =
            session(InMemoryPostStore::new().with_posts(test_posts(12)), None);

        session.activate(FeedView::Home).await.unwrap();

        let state = session.sync().snapshot();
        assert_eq!(state.len(), 10);
        assert_eq!(state.status, FeedStatus::Ready);
        assert_eq!(session.active_view(), Some(FeedView::Home));
        assert_eq!(feed.open_count(), 1);
        assert_eq!(feed.topics(), vec!["feed-home".to_string()]);
    }

    #[tokio::test]
    async fn switching_views_closes_old_subscription_first() {
        let (mut session, _store, feed) =
            session(InMemoryPostStore::new().with_posts(test_posts(3)), None);

        session.activate(FeedView::Home).await.unwrap();
        session.activate(FeedView::Trending).await.unwrap();
        session.activate(FeedView::Featured).await.unwrap();

        assert_eq!(feed.opened_total(), 3);
        assert_eq!(feed.open_count(), 1);
        assert!(!feed.overlapped());
    }

    #[tokio::test]
    async fn deactivation_closes_subscription() {
        let (mut session, _store, feed) =
            session(InMemoryPostStore::new().with_posts(test_posts(3)), None);

        session.activate(FeedView::Home).await.unwrap();
        session.deactivate().await;

        assert_eq!(feed.open_count(), 0);
        assert_eq!(session.active_view(), None);
        let state = session.sync().snapshot();
        assert_eq!(state.status, FeedStatus::Deactivated);
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn dropping_session_closes_subscription() {
        let (mut session, _store, feed) =
            session(InMemoryPostStore::new().with_posts(test_posts(3)), None);
        session.activate(FeedView::Home).await.unwrap();

        drop(session);
        assert_eq!(feed.open_count(), 0);
    }

    #[tokio::test]
    async fn subscription_failure_still_loads() {
        let (mut session, _store, feed) =
            session(InMemoryPostStore::new().with_posts(test_posts(4)), None);
        feed.set_failing(true);

        session.activate(FeedView::Home).await.unwrap();
        assert_eq!(session.sync().snapshot().len(), 4);
        assert_eq!(feed.open_count(), 0);
    }

    #[tokio::test]
    async fn pushed_insert_is_fetched_and_prepended() {
        let (mut session, store, feed) =
            session(InMemoryPostStore::new().with_posts(test_posts(3)), None);
        session.activate(FeedView::Home).await.unwrap();
        let mut updates = session.sync().subscribe();

        let fresh = test_post();
        store.add_post(fresh.clone());
        feed.push(ChangeEvent::PostInserted(fresh.id)).await;

        wait_for(&mut updates, |state| state.contains(&fresh.id)).await;
        assert_eq!(session.sync().snapshot().items[0].post.id, fresh.id);
    }

    #[tokio::test]
    async fn pushed_update_and_delete_apply() {
        let posts = test_posts(3);
        let (mut session, _store, feed) =
            session(InMemoryPostStore::new().with_posts(posts.clone()), None);
        session.activate(FeedView::Home).await.unwrap();
        let mut updates = session.sync().subscribe();

        feed.push(ChangeEvent::PostUpdated(
            PostPatch::new(posts[1].id).with_like_count(30),
        ))
        .await;
        feed.push(ChangeEvent::PostDeleted(posts[0].id)).await;

        wait_for(&mut updates, |state| !state.contains(&posts[0].id)).await;
        let state = session.sync().snapshot();
        assert_eq!(state.get(&posts[1].id).unwrap().post.like_count, 30);
        assert_eq!(state.len(), 2);
    }

    #[tokio::test]
    async fn pushed_insert_of_hidden_post_is_dropped() {
        let (mut session, store, feed) =
            session(InMemoryPostStore::new().with_posts(test_posts(2)), None);
        session.activate(FeedView::Home).await.unwrap();

        let mut hidden = test_post();
        hidden.is_hidden = true;
        store.add_post(hidden.clone());
        feed.push(ChangeEvent::PostInserted(hidden.id)).await;

        let marker = test_posts(1).remove(0);
        store.add_post(marker.clone());
        feed.push(ChangeEvent::PostInserted(marker.id)).await;

        let mut updates = session.sync().subscribe();
        wait_for(&mut updates, |state| state.contains(&marker.id)).await;
        assert!(!session.sync().snapshot().contains(&hidden.id));
    }

    #[tokio::test(start_paused = true)]
    async fn like_bursts_trigger_one_refresh() {
        let (mut session, store, feed) =
            session(InMemoryPostStore::new().with_posts(test_posts(3)), None);
        session.activate(FeedView::Home).await.unwrap();
        assert_eq!(store.fetch_count(), 1);

        for _ in 0..4 {
            feed.push(ChangeEvent::LikesChanged).await;
        }
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.fetch_count(), 2);
        assert_eq!(session.sync().snapshot().status, FeedStatus::Ready);
    }

    #[tokio::test]
    async fn following_view_uses_followed_authors() {
        let viewer = ProfileId::new();
        let followed = test_profile();
        let stranger = test_profile();
        let mine = test_post_by(&followed);
        let theirs = test_post_by(&stranger);
        let store = InMemoryPostStore::new()
            .with_posts(vec![mine.clone(), theirs.clone()])
            .with_following(viewer, vec![followed.id]);
        let (mut session, store, _feed) = session(store, Some(viewer));

        session.activate(FeedView::Following).await.unwrap();

        assert_eq!(session.sync().snapshot().ids(), vec![mine.id]);
        let request = &store.requests()[0];
        assert_eq!(request.view.view, FeedView::Following);
        assert!(matches!(request.view.authors, AuthorFilter::Among(_)));
    }

    #[tokio::test]
    async fn following_without_viewer_falls_back_to_prolific_authors() {
        let mut prolific = test_profile();
        prolific.post_count = 12;
        let quiet = test_profile();
        let loud = test_post_by(&prolific);
        let store = InMemoryPostStore::new().with_posts(vec![loud.clone(), test_post_by(&quiet)]);
        let (mut session, _store, _feed) = session(store, None);

        session.activate(FeedView::Following).await.unwrap();

        assert_eq!(session.sync().snapshot().ids(), vec![loud.id]);
    }
}
