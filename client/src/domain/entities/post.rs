//! Post domain entity
//!
//! A short text artifact shared to the feed, with its author and
//! engagement counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProfileId, ProfileSummary};
use crate::error::DomainError;

/// Unique identifier for a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PostId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PostId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(PostId)
            .map_err(|e| format!("Invalid post id {}: {}", s, e))
    }
}

/// Category of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Quote,
    Poem,
    Thought,
    Lyric,
    HookupLine,
    HingePrompt,
}

impl PostType {
    pub const ALL: [PostType; 6] = [
        PostType::Quote,
        PostType::Poem,
        PostType::Thought,
        PostType::Lyric,
        PostType::HookupLine,
        PostType::HingePrompt,
    ];

    /// Human label shown on the post badge
    pub fn label(&self) -> &'static str {
        match self {
            PostType::Quote => "Quote",
            PostType::Poem => "Poem",
            PostType::Thought => "Thought",
            PostType::Lyric => "Lyric",
            PostType::HookupLine => "Pickup Line",
            PostType::HingePrompt => "Dating Prompt",
        }
    }
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostType::Quote => write!(f, "quote"),
            PostType::Poem => write!(f, "poem"),
            PostType::Thought => write!(f, "thought"),
            PostType::Lyric => write!(f, "lyric"),
            PostType::HookupLine => write!(f, "hookup_line"),
            PostType::HingePrompt => write!(f, "hinge_prompt"),
        }
    }
}

impl std::str::FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quote" => Ok(PostType::Quote),
            "poem" => Ok(PostType::Poem),
            "thought" => Ok(PostType::Thought),
            "lyric" => Ok(PostType::Lyric),
            "hookup_line" => Ok(PostType::HookupLine),
            "hinge_prompt" => Ok(PostType::HingePrompt),
            _ => Err(format!("Unknown post type: {}", s)),
        }
    }
}

/// A post as displayed in a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub author: ProfileSummary,
    pub content: String,
    pub post_type: PostType,
    pub like_count: i64,
    pub comment_count: i64,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

/// A post to insert for `user_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub user_id: ProfileId,
    pub content: String,
    pub post_type: PostType,
}

impl NewPost {
    /// Trimmed post by `author`; blank content is rejected
    pub fn new(author: ProfileId, content: &str, post_type: PostType) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::Validation("Post content is empty".to_string()));
        }
        Ok(Self {
            user_id: author,
            content: content.to_string(),
            post_type,
        })
    }
}

/// Partial post row delivered by an update event
///
/// Only the id is guaranteed; absent fields leave the local value alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostPatch {
    pub id: PostId,
    pub content: Option<String>,
    pub post_type: Option<PostType>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub is_hidden: Option<bool>,
}

impl PostPatch {
    pub fn new(id: PostId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_like_count(mut self, like_count: i64) -> Self {
        self.like_count = Some(like_count);
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.is_hidden = Some(hidden);
        self
    }

    /// Merge present fields into `post`. Returns false on identity mismatch.
    pub fn apply_to(&self, post: &mut Post) -> bool {
        if post.id != self.id {
            return false;
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(post_type) = self.post_type {
            post.post_type = post_type;
        }
        if let Some(like_count) = self.like_count {
            post.like_count = like_count.max(0);
        }
        if let Some(comment_count) = self.comment_count {
            post.comment_count = comment_count.max(0);
        }
        if let Some(is_hidden) = self.is_hidden {
            post.is_hidden = is_hidden;
        }
        true
    }
}
