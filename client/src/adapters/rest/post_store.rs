//! REST adapter for PostStore and PostRepository

use async_trait::async_trait;
use std::sync::Arc;

use super::client::RestClient;
use super::query::Query;
use super::rows::{self, FollowRow};
use crate::domain::entities::{AuthorFilter, FeedOrder, NewPost, Post, PostId, ProfileId};
use crate::domain::ports::{PageRequest, PostRepository, PostStore};
use crate::error::DomainError;

/// Reads feed pages and the follow graph, and writes posts, over REST
pub struct RestPostStore {
    client: Arc<RestClient>,
}

impl RestPostStore {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

/// Build the posts query for one page of a view
pub fn page_query(request: &PageRequest) -> Query {
    let columns = match request.view.authors {
        AuthorFilter::MinPosts(_) | AuthorFilter::MinFollowers(_) => rows::post_columns_inner(),
        AuthorFilter::Any | AuthorFilter::Among(_) => rows::post_columns(),
    };
    let mut query = Query::new().select(&columns).eq("is_hidden", false);

    query = match &request.view.authors {
        AuthorFilter::Any => query,
        AuthorFilter::Among(ids) => {
            let mut ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            ids.sort();
            query.in_list("user_id", &ids)
        }
        AuthorFilter::MinPosts(min) => query.gte("profiles.post_count", min),
        AuthorFilter::MinFollowers(min) => query.gte("profiles.follower_count", min),
    };

    let order = match request.view.order() {
        FeedOrder::Newest => "created_at.desc",
        FeedOrder::MostLiked => "like_count.desc,created_at.desc",
    };

    query
        .order(order)
        .range(request.offset(), request.page_size)
}

/// Delete filter that only matches the owner's row
pub fn owned_post_query(id: &PostId, owner: &ProfileId) -> Query {
    Query::new().eq("id", id).eq("user_id", owner)
}

#[async_trait]
impl PostStore for RestPostStore {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Post>, DomainError> {
        let rows = self.client.select("posts", &page_query(request)).await?;
        Ok(rows::decode_posts(rows))
    }

    async fn fetch_post(&self, id: &PostId) -> Result<Option<Post>, DomainError> {
        let query = Query::new()
            .select(&rows::post_columns())
            .eq("id", id)
            .eq("is_hidden", false)
            .limit(1);
        let rows = self.client.select("posts", &query).await?;

        match rows.into_iter().next() {
            Some(row) => rows::decode_post(row).map(Some),
            None => Ok(None),
        }
    }

    async fn following_ids(&self, user: &ProfileId) -> Result<Vec<ProfileId>, DomainError> {
        let query = Query::new()
            .select("following_id")
            .eq("follower_id", user);
        let rows = self.client.select("follows", &query).await?;

        Ok(rows::decode_rows::<FollowRow>(rows, "follows")
            .into_iter()
            .map(|row| ProfileId(row.following_id))
            .collect())
    }
}

#[async_trait]
impl PostRepository for RestPostStore {
    async fn create(&self, post: &NewPost) -> Result<PostId, DomainError> {
        let rows = self.client.insert_returning("posts", post, "id").await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::Backend("Post insert returned no row".to_string()))?;
        rows::decode_id(row)
    }

    async fn delete(&self, id: &PostId, owner: &ProfileId) -> Result<(), DomainError> {
        self.client.delete("posts", &owned_post_query(id, owner)).await?;
        Ok(())
    }
}
