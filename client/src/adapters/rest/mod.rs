//! REST adapter
//!
//! PostgREST-style client for the hosted relational store and the
//! repositories built on it.

pub mod client;
pub mod comment_repo;
pub mod like_repo;
pub mod notification_repo;
pub mod post_store;
pub mod query;
pub mod rows;

pub use client::RestClient;
pub use comment_repo::RestCommentRepository;
pub use like_repo::RestLikeRepository;
pub use notification_repo::RestNotificationRepository;
pub use post_store::RestPostStore;
pub use query::Query;
