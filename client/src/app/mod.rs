//! Application layer
//!
//! Contains the feed state machine and the services around it.
//! The synchronizer owns the state; the session drives it from change
//! subscriptions and the like, post and comment services from user actions.

pub mod coalescer;
pub mod comment_service;
pub mod feed_state;
pub mod feed_sync;
pub mod like_service;
pub mod post_service;
pub mod session;

pub use coalescer::{CoalescerHandle, RefreshCoalescer, REFRESH_COALESCE_WINDOW};
pub use comment_service::CommentService;
pub use feed_state::{FeedItem, FeedState, FeedStatus, LikeDelta};
pub use feed_sync::{FeedSynchronizer, PAGE_SIZE};
pub use like_service::LikeService;
pub use post_service::PostService;
pub use session::FeedSession;
