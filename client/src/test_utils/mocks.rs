//! Mock implementations of port traits
//!
//! In-memory implementations that can be configured for testing. They keep
//! their data behind shared locks so tests can seed, fail and inspect them
//! while the code under test holds an `Arc`.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{mpsc, Semaphore};

use chrono::Utc;

use crate::domain::entities::{
    FeedOrder, NewComment, NewLike, NewNotification, NewPost, Post, PostId, ProfileId,
    ProfileSummary,
};
use crate::domain::ports::{
    ChangeEvent, ChangeFeed, ChangeTable, CommentRepository, LikeRepository,
    NotificationRepository, PageRequest, PostRepository, PostStore, Subscription,
    SubscriptionHandle,
};
use crate::error::DomainError;

// ============================================================================
// In-Memory Post Store
// ============================================================================

#[derive(Default)]
pub struct InMemoryPostStore {
    posts: Arc<RwLock<Vec<Post>>>,
    pages: Arc<RwLock<HashMap<usize, Vec<Post>>>>,
    following: Arc<RwLock<HashMap<ProfileId, Vec<ProfileId>>>>,
    requests: Arc<RwLock<Vec<PageRequest>>>,
    fetches: AtomicUsize,
    failing: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with posts; pages are computed from the view
    pub fn with_posts(self, posts: Vec<Post>) -> Self {
        self.posts.write().unwrap().extend(posts);
        self
    }

    /// Script the exact rows returned for `page_index`
    pub fn with_page(self, page_index: usize, posts: Vec<Post>) -> Self {
        self.posts.write().unwrap().extend(posts.iter().cloned());
        self.pages.write().unwrap().insert(page_index, posts);
        self
    }

    pub fn with_following(self, user: ProfileId, followed: Vec<ProfileId>) -> Self {
        self.following.write().unwrap().insert(user, followed);
        self
    }

    /// Hold every page fetch until a permit is added to the returned gate
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn add_post(&self, post: Post) {
        self.posts.write().unwrap().push(post);
    }

    pub fn has_post(&self, id: &PostId) -> bool {
        self.posts.read().unwrap().iter().any(|post| post.id == *id)
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DomainError::Backend("connection reset".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.read().unwrap().clone()
    }

    fn computed_page(&self, request: &PageRequest) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .unwrap()
            .iter()
            .filter(|post| request.view.matches(post))
            .cloned()
            .collect();

        match request.view.order() {
            FeedOrder::Newest => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            FeedOrder::MostLiked => posts.sort_by(|a, b| {
                (b.like_count, b.created_at).cmp(&(a.like_count, a.created_at))
            }),
        }

        posts
            .into_iter()
            .skip(request.offset())
            .take(request.page_size)
            .collect()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Post>, DomainError> {
        self.requests.write().unwrap().push(request.clone());
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.check()?;

        let scripted = self.pages.read().unwrap();
        if !scripted.is_empty() {
            return Ok(scripted.get(&request.page_index).cloned().unwrap_or_default());
        }
        drop(scripted);
        Ok(self.computed_page(request))
    }

    async fn fetch_post(&self, id: &PostId) -> Result<Option<Post>, DomainError> {
        self.check()?;
        let posts = self.posts.read().unwrap();
        Ok(posts.iter().find(|post| post.id == *id).cloned())
    }

    async fn following_ids(&self, user: &ProfileId) -> Result<Vec<ProfileId>, DomainError> {
        self.check()?;
        let following = self.following.read().unwrap();
        Ok(following.get(user).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostStore {
    async fn create(&self, post: &NewPost) -> Result<PostId, DomainError> {
        self.check()?;
        let mut posts = self.posts.write().unwrap();
        let author = posts
            .iter()
            .find(|existing| existing.author.id == post.user_id)
            .map(|existing| existing.author.clone())
            .unwrap_or_else(|| ProfileSummary::placeholder(post.user_id));

        let id = PostId::new();
        posts.push(Post {
            id,
            author,
            content: post.content.clone(),
            post_type: post.post_type,
            like_count: 0,
            comment_count: 0,
            is_hidden: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn delete(&self, id: &PostId, owner: &ProfileId) -> Result<(), DomainError> {
        self.check()?;
        self.posts
            .write()
            .unwrap()
            .retain(|post| !(post.id == *id && post.author.id == *owner));
        Ok(())
    }
}

// ============================================================================
// In-Memory Like Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryLikeRepository {
    likes: Arc<RwLock<HashSet<(ProfileId, PostId)>>>,
    failing: AtomicBool,
}

impl InMemoryLikeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an existing like without going through the port
    pub fn seed(&self, user: ProfileId, post: PostId) {
        self.likes.write().unwrap().insert((user, post));
    }

    pub fn contains(&self, user: &ProfileId, post: &PostId) -> bool {
        self.likes.read().unwrap().contains(&(*user, *post))
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DomainError::Backend("likes unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LikeRepository for InMemoryLikeRepository {
    async fn liked_among(
        &self,
        user: &ProfileId,
        posts: &[PostId],
    ) -> Result<Vec<PostId>, DomainError> {
        self.check()?;
        let likes = self.likes.read().unwrap();
        Ok(posts
            .iter()
            .filter(|post| likes.contains(&(*user, **post)))
            .copied()
            .collect())
    }

    async fn like(&self, like: &NewLike) -> Result<(), DomainError> {
        self.check()?;
        self.likes
            .write()
            .unwrap()
            .insert((like.user_id, like.post_id));
        Ok(())
    }

    async fn unlike(&self, like: &NewLike) -> Result<(), DomainError> {
        self.check()?;
        self.likes
            .write()
            .unwrap()
            .remove(&(like.user_id, like.post_id));
        Ok(())
    }
}

// ============================================================================
// In-Memory Comment Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryCommentRepository {
    comments: Arc<RwLock<Vec<NewComment>>>,
    failing: AtomicBool,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comments(&self) -> Vec<NewComment> {
        self.comments.read().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(&self, comment: &NewComment) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Backend("comments unavailable".to_string()));
        }
        self.comments.write().unwrap().push(comment.clone());
        Ok(())
    }
}

// ============================================================================
// In-Memory Notification Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    sent: Arc<RwLock<Vec<NewNotification>>>,
    failing: AtomicBool,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<NewNotification> {
        self.sent.read().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Backend("notifications unavailable".to_string()));
        }
        self.sent.write().unwrap().push(notification.clone());
        Ok(())
    }
}

// ============================================================================
// Mock Change Feed
// ============================================================================

/// Change feed that tracks how many subscriptions are open at once
#[derive(Default)]
pub struct MockChangeFeed {
    senders: Arc<Mutex<HashMap<u64, mpsc::Sender<ChangeEvent>>>>,
    topics: Arc<RwLock<Vec<String>>>,
    next_id: AtomicU64,
    open: Arc<AtomicUsize>,
    opened_total: AtomicUsize,
    overlapped: AtomicBool,
    failing: AtomicBool,
}

impl MockChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Deliver `event` to every open subscription
    pub async fn push(&self, event: ChangeEvent) {
        let senders: Vec<mpsc::Sender<ChangeEvent>> =
            self.senders.lock().unwrap().values().cloned().collect();
        for sender in senders {
            let _ = sender.send(event.clone()).await;
        }
    }

    pub fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn opened_total(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }

    /// Whether a subscription was ever opened while another was still open
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.read().unwrap().clone()
    }
}

#[async_trait]
impl ChangeFeed for MockChangeFeed {
    async fn subscribe(
        &self,
        topic: &str,
        _tables: &[ChangeTable],
    ) -> Result<Subscription, DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Backend("realtime unavailable".to_string()));
        }

        if self.open.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.opened_total.fetch_add(1, Ordering::SeqCst);
        self.topics.write().unwrap().push(topic.to_string());

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        self.senders.lock().unwrap().insert(id, tx);

        let senders = self.senders.clone();
        let open = self.open.clone();
        let handle = SubscriptionHandle::new(move || {
            senders.lock().unwrap().remove(&id);
            open.fetch_sub(1, Ordering::SeqCst);
        });
        Ok(Subscription::new(rx, handle))
    }
}
