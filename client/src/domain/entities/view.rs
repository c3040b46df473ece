//! Feed views
//!
//! A view is a named filter and ordering policy over posts. `ResolvedView`
//! binds a view to the concrete data its filter needs (the followed authors
//! for `following`), so it can both build a query and test pushed posts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Post, ProfileId};

/// Minimum follower count for an author to appear in `featured`
pub const FEATURED_MIN_FOLLOWERS: i64 = 10;

/// Minimum post count used by `following` when the user follows nobody
pub const FOLLOWING_FALLBACK_MIN_POSTS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedView {
    #[default]
    Home,
    Following,
    Trending,
    Featured,
}

impl FeedView {
    pub const ALL: [FeedView; 4] = [
        FeedView::Home,
        FeedView::Following,
        FeedView::Trending,
        FeedView::Featured,
    ];

    pub fn order(&self) -> FeedOrder {
        match self {
            FeedView::Trending => FeedOrder::MostLiked,
            FeedView::Home | FeedView::Following | FeedView::Featured => FeedOrder::Newest,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FeedView::Home => "Home",
            FeedView::Following => "Following",
            FeedView::Trending => "Trending",
            FeedView::Featured => "Featured",
        }
    }
}

impl std::fmt::Display for FeedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedView::Home => write!(f, "home"),
            FeedView::Following => write!(f, "following"),
            FeedView::Trending => write!(f, "trending"),
            FeedView::Featured => write!(f, "featured"),
        }
    }
}

impl std::str::FromStr for FeedView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" => Ok(FeedView::Home),
            "following" => Ok(FeedView::Following),
            "trending" => Ok(FeedView::Trending),
            "featured" => Ok(FeedView::Featured),
            _ => Err(format!(
                "Unknown feed view: {}. Use: home, following, trending, featured",
                s
            )),
        }
    }
}

/// Server-side ordering of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrder {
    /// `created_at` descending
    Newest,
    /// `like_count` descending, then `created_at` descending
    MostLiked,
}

impl FeedOrder {
    /// Whether `a` sorts strictly before `b`
    pub fn ranks_before(&self, a: &Post, b: &Post) -> bool {
        match self {
            FeedOrder::Newest => a.created_at > b.created_at,
            FeedOrder::MostLiked => {
                a.like_count > b.like_count
                    || (a.like_count == b.like_count && a.created_at > b.created_at)
            }
        }
    }
}

/// Restriction on post authors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorFilter {
    Any,
    Among(HashSet<ProfileId>),
    MinPosts(i64),
    MinFollowers(i64),
}

/// A view bound to the data its filter needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedView {
    pub view: FeedView,
    pub authors: AuthorFilter,
}

impl ResolvedView {
    /// Resolve `view`; `followed` only matters for `following`
    pub fn new(view: FeedView, followed: Vec<ProfileId>) -> Self {
        let authors = match view {
            FeedView::Home | FeedView::Trending => AuthorFilter::Any,
            FeedView::Featured => AuthorFilter::MinFollowers(FEATURED_MIN_FOLLOWERS),
            FeedView::Following if followed.is_empty() => {
                AuthorFilter::MinPosts(FOLLOWING_FALLBACK_MIN_POSTS)
            }
            FeedView::Following => AuthorFilter::Among(followed.into_iter().collect()),
        };
        Self { view, authors }
    }

    pub fn order(&self) -> FeedOrder {
        self.view.order()
    }

    /// Whether `post` belongs in this view
    pub fn matches(&self, post: &Post) -> bool {
        if post.is_hidden {
            return false;
        }
        match &self.authors {
            AuthorFilter::Any => true,
            AuthorFilter::Among(ids) => ids.contains(&post.author.id),
            AuthorFilter::MinPosts(min) => post.author.post_count >= *min,
            AuthorFilter::MinFollowers(min) => post.author.follower_count >= *min,
        }
    }
}

impl From<FeedView> for ResolvedView {
    fn from(view: FeedView) -> Self {
        ResolvedView::new(view, Vec::new())
    }
}
