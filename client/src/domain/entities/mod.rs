//! Domain entities
//!
//! Explicit types for what the backend returns as loosely-typed rows.
//! Conversion from rows happens in the REST adapter.

pub mod comment;
pub mod like;
pub mod post;
pub mod profile;
pub mod view;

pub use comment::{CommentId, NewComment};
pub use like::{NewLike, NewNotification, NotificationKind};
pub use post::{NewPost, Post, PostId, PostPatch, PostType};
pub use profile::{ProfileId, ProfileSummary};
pub use view::{
    AuthorFilter, FeedOrder, FeedView, ResolvedView, FEATURED_MIN_FOLLOWERS,
    FOLLOWING_FALLBACK_MIN_POSTS,
};
