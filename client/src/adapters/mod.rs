//! Adapters layer
//!
//! Implementations of port traits for the hosted backend.

pub mod realtime;
pub mod rest;

pub use realtime::RealtimeClient;
pub use rest::{
    RestClient, RestCommentRepository, RestLikeRepository, RestNotificationRepository,
    RestPostStore,
};
