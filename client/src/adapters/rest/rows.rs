//! Backend row types
//!
//! Rows arrive as loosely-typed JSON, both from REST selects and inside
//! realtime change records. They are deserialized into explicit row structs
//! here and converted into domain types; nothing untyped crosses into the
//! app layer.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::{Post, PostId, PostPatch, PostType, ProfileId, ProfileSummary};
use crate::error::DomainError;

const PROFILE_COLUMNS: &str = "id,username,display_name,avatar_url,post_count,follower_count,is_admin";

/// Post columns with the author embedded
pub fn post_columns() -> String {
    format!("*,profiles({})", PROFILE_COLUMNS)
}

/// Post columns with an inner-joined author, needed to filter on profile fields
pub fn post_columns_inner() -> String {
    format!("*,profiles!inner({})", PROFILE_COLUMNS)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    pub id: Option<Uuid>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub post_count: Option<i64>,
    pub follower_count: Option<i64>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostRow {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub content: Option<String>,
    pub post_type: Option<String>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub is_hidden: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub profiles: Option<ProfileRow>,
}

fn parse_post_type(raw: Option<&str>) -> Result<Option<PostType>, DomainError> {
    raw.map(|s| s.parse::<PostType>().map_err(DomainError::Validation))
        .transpose()
}

impl ProfileRow {
    fn into_summary(self, fallback_id: Option<Uuid>) -> Option<ProfileSummary> {
        let id = self.id.or(fallback_id)?;
        let username = self.username.unwrap_or_else(|| "unknown".to_string());
        Some(ProfileSummary {
            id: ProfileId(id),
            display_name: self.display_name.unwrap_or_else(|| username.clone()),
            username,
            avatar_url: self.avatar_url,
            post_count: self.post_count.unwrap_or(0).max(0),
            follower_count: self.follower_count.unwrap_or(0).max(0),
            is_admin: self.is_admin.unwrap_or(false),
        })
    }
}

impl TryFrom<PostRow> for Post {
    type Error = DomainError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .ok_or_else(|| DomainError::Validation("post row without id".to_string()))?;
        let post_type = parse_post_type(row.post_type.as_deref())?.ok_or_else(|| {
            DomainError::Validation(format!("post {} has no post_type", id))
        })?;
        let created_at = row.created_at.ok_or_else(|| {
            DomainError::Validation(format!("post {} has no created_at", id))
        })?;

        let author = match row.profiles {
            Some(profile) => profile.into_summary(row.user_id),
            None => None,
        }
        .or_else(|| row.user_id.map(|uid| ProfileSummary::placeholder(ProfileId(uid))))
        .ok_or_else(|| DomainError::Validation(format!("post {} has no author", id)))?;

        Ok(Post {
            id: PostId(id),
            author,
            content: row.content.unwrap_or_default(),
            post_type,
            like_count: row.like_count.unwrap_or(0).max(0),
            comment_count: row.comment_count.unwrap_or(0).max(0),
            is_hidden: row.is_hidden.unwrap_or(false),
            created_at,
        })
    }
}

impl TryFrom<PostRow> for PostPatch {
    type Error = DomainError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .ok_or_else(|| DomainError::Validation("post update without id".to_string()))?;
        Ok(PostPatch {
            id: PostId(id),
            content: row.content,
            post_type: parse_post_type(row.post_type.as_deref())?,
            like_count: row.like_count,
            comment_count: row.comment_count,
            is_hidden: row.is_hidden,
        })
    }
}

/// Decode a list of post rows, skipping rows that fail validation
pub fn decode_posts(rows: Vec<Value>) -> Vec<Post> {
    rows.into_iter()
        .filter_map(|value| match decode_post(value) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::warn!("Skipping malformed post row: {}", e);
                None
            }
        })
        .collect()
}

pub fn decode_post(value: Value) -> Result<Post, DomainError> {
    let row: PostRow =
        serde_json::from_value(value).map_err(|e| DomainError::Validation(e.to_string()))?;
    Post::try_from(row)
}

pub fn decode_patch(value: Value) -> Result<PostPatch, DomainError> {
    let row: PostRow =
        serde_json::from_value(value).map_err(|e| DomainError::Validation(e.to_string()))?;
    PostPatch::try_from(row)
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

/// The `id` column of a row
pub fn decode_id(value: Value) -> Result<PostId, DomainError> {
    let row: IdRow =
        serde_json::from_value(value).map_err(|e| DomainError::Validation(e.to_string()))?;
    Ok(PostId(row.id))
}

#[derive(Debug, Deserialize)]
pub struct FollowRow {
    pub following_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LikeRow {
    pub post_id: Uuid,
}

/// Decode rows of a single known shape, skipping the ones that do not fit
pub fn decode_rows<T: for<'de> Deserialize<'de>>(rows: Vec<Value>, table: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!("Skipping malformed {} row: {}", table, e);
                None
            }
        })
        .collect()
}
