//! Feed synchronizer
//!
//! Owns the `FeedState` of the active view and reconciles page fetches,
//! optimistic likes and pushed row changes.
//!
//! The state lock is never held across a backend call. Each load is tagged
//! with the activation epoch and a load sequence number; a result whose tag
//! is no longer current is discarded. Pushed changes that arrive while the
//! first page is loading are queued and replayed once it settles, so the page
//! replacement cannot overwrite them. A load whose future is dropped before
//! it settles is abandoned: its ticket is cleared and the queue replayed.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::feed_state::{FeedItem, FeedState, FeedStatus, LikeDelta};
use crate::domain::entities::{Post, PostId, PostPatch, ResolvedView};
use crate::domain::ports::{PageRequest, PostStore};
use crate::error::{DomainError, FeedError};

/// Posts per page
pub const PAGE_SIZE: usize = 10;

/// A pushed row change
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RemoteChange {
    Insert(Post),
    Update(PostPatch),
    Delete(PostId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoadTicket {
    epoch: u64,
    seq: u64,
    page_index: usize,
}

/// Status and ticket to restore when a load is abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
struct IssuedLoad {
    ticket: LoadTicket,
    previous: FeedStatus,
}

#[derive(Debug, Default)]
struct Inner {
    state: FeedState,
    view: Option<ResolvedView>,
    epoch: u64,
    next_seq: u64,
    in_flight: Option<LoadTicket>,
    pending: VecDeque<RemoteChange>,
}

impl Inner {
    /// Issue a load for `page_index`; it supersedes any load in flight
    fn begin_load(&mut self, page_index: usize) -> Result<(IssuedLoad, PageRequest), FeedError> {
        let view = self.view.clone().ok_or(FeedError::Inactive)?;
        let previous = self.state.status.clone();

        self.next_seq += 1;
        let ticket = LoadTicket {
            epoch: self.epoch,
            seq: self.next_seq,
            page_index,
        };
        self.in_flight = Some(ticket);
        self.state.status = if page_index == 0 {
            FeedStatus::Loading
        } else {
            FeedStatus::LoadingMore(page_index)
        };

        Ok((
            IssuedLoad { ticket, previous },
            PageRequest::new(view, page_index, PAGE_SIZE),
        ))
    }

    /// Forget a load that will never settle. Returns whether state changed.
    fn abandon(&mut self, issued: &IssuedLoad) -> bool {
        if self.in_flight != Some(issued.ticket) {
            return false;
        }
        tracing::debug!("Abandoned load of page {}", issued.ticket.page_index);
        self.in_flight = None;

        // A superseded load's status says nothing about the list now
        self.state.status = if issued.previous.is_loading() {
            if self.state.is_empty() {
                FeedStatus::Idle
            } else {
                FeedStatus::Ready
            }
        } else {
            issued.previous.clone()
        };
        self.replay_pending();
        true
    }

    fn apply(&mut self, change: RemoteChange) -> bool {
        let Some(view) = self.view.as_ref() else {
            return false;
        };
        match change {
            RemoteChange::Insert(post) => self.state.insert_remote(post, view),
            RemoteChange::Update(patch) => self.state.merge_remote(&patch),
            RemoteChange::Delete(id) => self.state.remove(&id),
        }
    }

    fn replay_pending(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!("Replaying {} queued feed changes", self.pending.len());
        }
        while let Some(change) = self.pending.pop_front() {
            self.apply(change);
        }
    }
}

/// Abandons its load on drop unless the load settled first
struct LoadGuard {
    inner: Arc<Mutex<Inner>>,
    updates: Arc<watch::Sender<FeedState>>,
    issued: Option<IssuedLoad>,
}

impl LoadGuard {
    fn settled(mut self) {
        self.issued = None;
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        let Some(issued) = self.issued.take() else {
            return;
        };

        if let Ok(mut inner) = self.inner.try_lock() {
            if inner.abandon(&issued) {
                self.updates.send_replace(inner.state.clone());
            }
            return;
        }

        // Lock is busy; finish the cleanup on the runtime
        let inner = self.inner.clone();
        let updates = self.updates.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let mut inner = inner.lock().await;
                    if inner.abandon(&issued) {
                        updates.send_replace(inner.state.clone());
                    }
                });
            }
            Err(_) => tracing::warn!(
                "Could not release abandoned load of page {}",
                issued.ticket.page_index
            ),
        }
    }
}

/// Keeps one view's feed consistent under concurrent async inputs
pub struct FeedSynchronizer<S: PostStore> {
    store: Arc<S>,
    inner: Arc<Mutex<Inner>>,
    updates: Arc<watch::Sender<FeedState>>,
}

impl<S: PostStore> Clone for FeedSynchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            inner: self.inner.clone(),
            updates: self.updates.clone(),
        }
    }
}

impl<S: PostStore> FeedSynchronizer<S> {
    pub fn new(store: Arc<S>) -> Self {
        let (updates, _) = watch::channel(FeedState::new());
        Self {
            store,
            inner: Arc::new(Mutex::new(Inner::default())),
            updates: Arc::new(updates),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// State transitions for the renderer
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.updates.subscribe()
    }

    /// Latest published state
    pub fn snapshot(&self) -> FeedState {
        self.updates.borrow().clone()
    }

    pub async fn item(&self, id: &PostId) -> Option<FeedItem> {
        self.inner.lock().await.state.get(id).cloned()
    }

    pub async fn active_view(&self) -> Option<ResolvedView> {
        self.inner.lock().await.view.clone()
    }

    pub async fn epoch(&self) -> u64 {
        self.inner.lock().await.epoch
    }

    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.state.clone());
    }

    /// Start a fresh, empty state for `view`. Returns the new epoch.
    pub async fn activate(&self, view: ResolvedView) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        tracing::debug!("Activating {} feed (epoch {})", view.view, inner.epoch);

        inner.view = Some(view);
        inner.state = FeedState::new();
        inner.in_flight = None;
        inner.pending.clear();
        self.publish(&inner);
        inner.epoch
    }

    /// Drop the current view; results still in flight will be discarded
    pub async fn deactivate(&self) {
        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        if let Some(view) = inner.view.take() {
            tracing::debug!("Deactivating {} feed", view.view);
        }

        inner.state = FeedState::new();
        inner.state.status = FeedStatus::Deactivated;
        inner.in_flight = None;
        inner.pending.clear();
        self.publish(&inner);
    }

    /// Load one page of the active view.
    ///
    /// Page 0 replaces the list and later pages append. On failure the items
    /// are kept and the status becomes `Error`.
    pub async fn load_page(&self, page_index: usize) -> Result<(), FeedError> {
        let (issued, request) = {
            let mut inner = self.inner.lock().await;
            let issued = inner.begin_load(page_index)?;
            self.publish(&inner);
            issued
        };
        self.run_load(issued, request).await
    }

    /// Load the page at the cursor. Returns false when there is nothing more
    /// to load or a load is already in flight.
    pub async fn load_more(&self) -> Result<bool, FeedError> {
        let (issued, request) = {
            let mut inner = self.inner.lock().await;
            if inner.view.is_none() {
                return Err(FeedError::Inactive);
            }
            if !inner.state.has_more || inner.in_flight.is_some() {
                return Ok(false);
            }
            let cursor = inner.state.cursor;
            let issued = inner.begin_load(cursor)?;
            self.publish(&inner);
            issued
        };
        self.run_load(issued, request).await.map(|_| true)
    }

    /// Clear the list, reset the cursor and load page 0
    pub async fn refresh(&self) -> Result<(), FeedError> {
        let (issued, request) = {
            let mut inner = self.inner.lock().await;
            if inner.view.is_none() {
                return Err(FeedError::Inactive);
            }
            inner.state.clear();
            let issued = inner.begin_load(0)?;
            self.publish(&inner);
            issued
        };
        self.run_load(issued, request).await
    }

    /// Reload page 0 in place unless a load is already running.
    ///
    /// Used by the refresh coalescer, so the list stays visible meanwhile.
    pub async fn reload_if_idle(&self) -> Result<bool, FeedError> {
        let (issued, request) = {
            let mut inner = self.inner.lock().await;
            if inner.view.is_none() || inner.in_flight.is_some() {
                return Ok(false);
            }
            let issued = inner.begin_load(0)?;
            self.publish(&inner);
            issued
        };
        self.run_load(issued, request).await.map(|_| true)
    }

    async fn run_load(&self, issued: IssuedLoad, request: PageRequest) -> Result<(), FeedError> {
        let ticket = issued.ticket;
        let guard = LoadGuard {
            inner: self.inner.clone(),
            updates: self.updates.clone(),
            issued: Some(issued),
        };

        let result = self.store.fetch_page(&request).await;
        let outcome = self.settle(ticket, result).await;
        guard.settled();
        outcome
    }

    async fn settle(
        &self,
        ticket: LoadTicket,
        result: Result<Vec<Post>, DomainError>,
    ) -> Result<(), FeedError> {
        let mut inner = self.inner.lock().await;
        if inner.epoch != ticket.epoch || inner.in_flight != Some(ticket) {
            tracing::debug!(
                "Discarding stale page {} (epoch {}, now {})",
                ticket.page_index,
                ticket.epoch,
                inner.epoch
            );
            return Err(FeedError::Stale);
        }
        inner.in_flight = None;

        let outcome = match result {
            Ok(posts) => {
                tracing::debug!("Loaded page {} with {} posts", ticket.page_index, posts.len());
                inner.state.apply_page(ticket.page_index, posts, PAGE_SIZE);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load page {}: {}", ticket.page_index, e);
                inner.state.fail(e.to_string());
                Err(FeedError::Domain(e))
            }
        };

        inner.replay_pending();
        self.publish(&inner);
        outcome
    }

    /// Apply an optimistic like before the mutation is confirmed.
    ///
    /// Keep the returned delta to revert if the mutation fails.
    pub async fn apply_optimistic_like(&self, id: &PostId, liked: bool) -> Option<LikeDelta> {
        let mut inner = self.inner.lock().await;
        let delta = inner.state.apply_like(id, liked);
        if delta.is_some() {
            self.publish(&inner);
        }
        delta
    }

    pub async fn revert_optimistic_like(&self, delta: &LikeDelta) -> bool {
        let mut inner = self.inner.lock().await;
        let reverted = inner.state.revert_like(delta);
        if reverted {
            self.publish(&inner);
        }
        reverted
    }

    /// Record the backend's like status for `checked`; `liked` are liked
    pub async fn mark_liked(&self, checked: &[PostId], liked: &[PostId]) {
        let mut inner = self.inner.lock().await;
        inner.state.mark_liked(checked, liked);
        self.publish(&inner);
    }

    /// Loaded posts whose like status was never checked
    pub async fn unchecked_like_ids(&self) -> Vec<PostId> {
        self.inner.lock().await.state.unchecked_ids()
    }

    pub async fn on_remote_insert(&self, post: Post) -> bool {
        self.apply_remote(None, RemoteChange::Insert(post)).await
    }

    pub async fn on_remote_update(&self, patch: PostPatch) -> bool {
        self.apply_remote(None, RemoteChange::Update(patch)).await
    }

    pub async fn on_remote_delete(&self, id: &PostId) -> bool {
        self.apply_remote(None, RemoteChange::Delete(*id)).await
    }

    /// Apply a change delivered for the activation `epoch`
    pub(crate) async fn apply_remote_at(&self, epoch: u64, change: RemoteChange) -> bool {
        self.apply_remote(Some(epoch), change).await
    }

    /// Returns whether the list changed now; queued changes report false
    async fn apply_remote(&self, epoch: Option<u64>, change: RemoteChange) -> bool {
        let mut inner = self.inner.lock().await;
        if epoch.is_some_and(|epoch| epoch != inner.epoch) || inner.view.is_none() {
            tracing::debug!("Ignoring change for an inactive feed");
            return false;
        }

        if inner.state.status == FeedStatus::Loading {
            inner.pending.push_back(change);
            return false;
        }

        let changed = inner.apply(change);
        if changed {
            self.publish(&inner);
        }
        changed
    }
}
