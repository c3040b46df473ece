//! Feed state
//!
//! The ordered, deduplicated item list for one active view and the pure
//! transitions applied to it. Everything async lives in the synchronizer;
//! this module only decides what a page, a pushed change or an optimistic
//! like does to the list.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::entities::{FeedOrder, Post, PostId, PostPatch, ResolvedView};

/// Renderer-facing status of a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FeedStatus {
    Idle,
    /// Loading page 0
    Loading,
    /// Loading a later page; items stay visible
    LoadingMore(usize),
    Ready,
    /// Last load failed; items from before the failure are kept
    Error(String),
    Deactivated,
}

impl FeedStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedStatus::Loading | FeedStatus::LoadingMore(_))
    }
}

/// A post plus what only this client knows about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub post: Post,
    pub liked_by_me: bool,
    /// Whether `liked_by_me` reflects the backend rather than the default
    #[serde(skip)]
    pub like_checked: bool,
}

impl FeedItem {
    pub fn new(post: Post) -> Self {
        Self {
            post,
            liked_by_me: false,
            like_checked: false,
        }
    }

    pub fn id(&self) -> PostId {
        self.post.id
    }
}

/// Applied optimistic like, kept by the caller to revert on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeDelta {
    pub post_id: PostId,
    /// Change applied to the like count (0 when clamped at zero)
    pub count_delta: i64,
    pub previously_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedState {
    pub items: Vec<FeedItem>,
    /// Index of the next page to load
    pub cursor: usize,
    pub has_more: bool,
    pub status: FeedStatus,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            has_more: true,
            status: FeedStatus::Idle,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.items.iter().any(|item| item.post.id == *id)
    }

    pub fn get(&self, id: &PostId) -> Option<&FeedItem> {
        self.items.iter().find(|item| item.post.id == *id)
    }

    fn get_mut(&mut self, id: &PostId) -> Option<&mut FeedItem> {
        self.items.iter_mut().find(|item| item.post.id == *id)
    }

    pub fn ids(&self) -> Vec<PostId> {
        self.items.iter().map(FeedItem::id).collect()
    }

    /// Reset to an empty first-page state
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
        self.has_more = true;
    }

    /// Apply a successful page fetch.
    ///
    /// Page 0 replaces the list, later pages append. Identities already
    /// present are skipped, hidden rows are dropped, and the local like flag
    /// survives a replacement.
    pub fn apply_page(&mut self, page_index: usize, posts: Vec<Post>, page_size: usize) {
        let returned = posts.len();

        if page_index == 0 {
            let known: HashMap<PostId, (bool, bool)> = self
                .items
                .iter()
                .map(|item| (item.post.id, (item.liked_by_me, item.like_checked)))
                .collect();
            let mut seen = HashSet::new();
            self.items = posts
                .into_iter()
                .filter(|post| !post.is_hidden && seen.insert(post.id))
                .map(|post| {
                    let (liked_by_me, like_checked) =
                        known.get(&post.id).copied().unwrap_or((false, false));
                    FeedItem {
                        post,
                        liked_by_me,
                        like_checked,
                    }
                })
                .collect();
        } else {
            let mut seen: HashSet<PostId> = self.items.iter().map(FeedItem::id).collect();
            for post in posts {
                if post.is_hidden || !seen.insert(post.id) {
                    continue;
                }
                self.items.push(FeedItem::new(post));
            }
        }

        self.has_more = returned == page_size;
        self.cursor = page_index + 1;
        self.status = FeedStatus::Ready;
    }

    /// Record a failed load without touching items or the cursor
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = FeedStatus::Error(message.into());
    }

    /// Insert a pushed post. Returns whether the list changed.
    ///
    /// Only accepted while the first page is displayed and the post belongs
    /// to `view`. Newest-first views take it at the head; `MostLiked` views
    /// place it by rank and skip it when that rank lies in an unloaded page.
    pub fn insert_remote(&mut self, post: Post, view: &ResolvedView) -> bool {
        if self.cursor > 1 || !view.matches(&post) || self.contains(&post.id) {
            return false;
        }

        let index = match view.order() {
            FeedOrder::Newest => 0,
            order @ FeedOrder::MostLiked => {
                let index = self
                    .items
                    .iter()
                    .position(|item| order.ranks_before(&post, &item.post))
                    .unwrap_or(self.items.len());
                if index == self.items.len() && self.has_more {
                    return false;
                }
                index
            }
        };

        self.items.insert(index, FeedItem::new(post));
        true
    }

    /// Merge a pushed update into the matching item. Server values win.
    ///
    /// A patch that hides the post removes it.
    pub fn merge_remote(&mut self, patch: &PostPatch) -> bool {
        if patch.is_hidden == Some(true) {
            return self.remove(&patch.id);
        }
        match self.get_mut(&patch.id) {
            Some(item) => patch.apply_to(&mut item.post),
            None => false,
        }
    }

    pub fn remove(&mut self, id: &PostId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.post.id != *id);
        self.items.len() != before
    }

    /// Optimistically set the like flag and adjust the count.
    ///
    /// Returns `None` when the item is not loaded or already in that state.
    pub fn apply_like(&mut self, id: &PostId, liked: bool) -> Option<LikeDelta> {
        let item = self.get_mut(id)?;
        if item.liked_by_me == liked {
            return None;
        }

        let previously_liked = item.liked_by_me;
        let count_delta = if liked {
            1
        } else if item.post.like_count > 0 {
            -1
        } else {
            0
        };
        item.post.like_count += count_delta;
        item.liked_by_me = liked;
        item.like_checked = true;

        Some(LikeDelta {
            post_id: *id,
            count_delta,
            previously_liked,
        })
    }

    /// Undo an optimistic like
    pub fn revert_like(&mut self, delta: &LikeDelta) -> bool {
        match self.get_mut(&delta.post_id) {
            Some(item) => {
                item.post.like_count = (item.post.like_count - delta.count_delta).max(0);
                item.liked_by_me = delta.previously_liked;
                true
            }
            None => false,
        }
    }

    /// Record the backend's like status for the `checked` items; those in
    /// `liked` are liked, the rest are not
    pub fn mark_liked(&mut self, checked: &[PostId], liked: &[PostId]) {
        let checked: HashSet<&PostId> = checked.iter().collect();
        let liked: HashSet<&PostId> = liked.iter().collect();
        for item in &mut self.items {
            if checked.contains(&item.post.id) {
                item.liked_by_me = liked.contains(&item.post.id);
                item.like_checked = true;
            }
        }
    }

    /// Loaded items whose like status has not been checked yet
    pub fn unchecked_ids(&self) -> Vec<PostId> {
        self.items
            .iter()
            .filter(|item| !item.like_checked)
            .map(FeedItem::id)
            .collect()
    }
}
