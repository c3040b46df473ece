//! Domain ports (traits)
//!
//! Port traits define what the client needs from the hosted backend.
//! Adapters provide concrete implementations of these traits.

pub mod change_feed;
pub mod store;

pub use change_feed::{ChangeEvent, ChangeFeed, ChangeTable, Subscription, SubscriptionHandle};
pub use store::{
    CommentRepository, LikeRepository, NotificationRepository, PageRequest, PostRepository,
    PostStore,
};
