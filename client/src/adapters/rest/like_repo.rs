//! REST adapter for LikeRepository

use async_trait::async_trait;
use std::sync::Arc;

use super::client::RestClient;
use super::query::Query;
use super::rows::{self, LikeRow};
use crate::domain::entities::{NewLike, PostId, ProfileId};
use crate::domain::ports::LikeRepository;
use crate::error::DomainError;

pub struct RestLikeRepository {
    client: Arc<RestClient>,
}

impl RestLikeRepository {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LikeRepository for RestLikeRepository {
    async fn liked_among(
        &self,
        user: &ProfileId,
        posts: &[PostId],
    ) -> Result<Vec<PostId>, DomainError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .select("post_id")
            .eq("user_id", user)
            .in_list("post_id", posts);
        let rows = self.client.select("likes", &query).await?;

        Ok(rows::decode_rows::<LikeRow>(rows, "likes")
            .into_iter()
            .map(|row| PostId(row.post_id))
            .collect())
    }

    async fn like(&self, like: &NewLike) -> Result<(), DomainError> {
        self.client.insert("likes", like).await?;
        Ok(())
    }

    async fn unlike(&self, like: &NewLike) -> Result<(), DomainError> {
        let query = Query::new()
            .eq("post_id", like.post_id)
            .eq("user_id", like.user_id);
        self.client.delete("likes", &query).await?;
        Ok(())
    }
}
