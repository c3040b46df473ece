//! Verse client
//!
//! Client-side feed synchronization for the Verse content-sharing app.
//! Persistence, auth and change streams live in a hosted backend; this crate
//! keeps the active feed view consistent while pages, optimistic likes and
//! pushed row changes arrive concurrently.
//!
//! Uses hexagonal (ports & adapters) architecture:
//! - `domain`: entities and port traits
//! - `adapters`: REST and realtime implementations of the ports
//! - `app`: feed synchronizer, session lifecycle, like, post and comment services

pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;

#[cfg(test)]
mod test_utils;

pub use adapters::{
    RealtimeClient, RestClient, RestCommentRepository, RestLikeRepository,
    RestNotificationRepository, RestPostStore,
};
pub use app::{
    CommentService, FeedItem, FeedSession, FeedState, FeedStatus, FeedSynchronizer,
    LikeService, PostService, RefreshCoalescer, PAGE_SIZE, REFRESH_COALESCE_WINDOW,
};
pub use config::Config;
pub use domain::entities::{
    CommentId, FeedView, Post, PostId, PostType, ProfileId, ProfileSummary,
};
pub use error::{BackendError, ConfigError, DomainError, FeedError, RealtimeError};
