//! Query and mutation port traits
//!
//! These traits define the interface to the hosted relational store.
//! Row-level authorization happens server-side.

use async_trait::async_trait;

use crate::domain::entities::{
    NewComment, NewLike, NewNotification, NewPost, Post, PostId, ProfileId, ResolvedView,
};
use crate::error::DomainError;

/// One page of a feed view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub view: ResolvedView,
    pub page_index: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(view: ResolvedView, page_index: usize, page_size: usize) -> Self {
        Self {
            view,
            page_index,
            page_size,
        }
    }

    pub fn offset(&self) -> usize {
        self.page_index * self.page_size
    }
}

/// Read access to posts and the follow graph
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fetch one page of visible posts, filtered and ordered by the view
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Post>, DomainError>;

    /// Fetch a single visible post with its author profile
    async fn fetch_post(&self, id: &PostId) -> Result<Option<Post>, DomainError>;

    /// Authors followed by `user`
    async fn following_ids(&self, user: &ProfileId) -> Result<Vec<ProfileId>, DomainError>;
}

/// Post writes by their authors
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post and return its id
    async fn create(&self, post: &NewPost) -> Result<PostId, DomainError>;

    /// Delete `id` if `owner` wrote it
    async fn delete(&self, id: &PostId, owner: &ProfileId) -> Result<(), DomainError>;
}

/// Likes made by users on posts
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Which of `posts` the user has liked
    async fn liked_among(
        &self,
        user: &ProfileId,
        posts: &[PostId],
    ) -> Result<Vec<PostId>, DomainError>;

    /// Insert a like row
    async fn like(&self, like: &NewLike) -> Result<(), DomainError>;

    /// Delete the like row
    async fn unlike(&self, like: &NewLike) -> Result<(), DomainError>;
}

/// Comments on posts
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &NewComment) -> Result<(), DomainError>;
}

/// Notifications delivered to other users
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &NewNotification) -> Result<(), DomainError>;
}
