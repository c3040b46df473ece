//! REST adapter for CommentRepository

use async_trait::async_trait;
use std::sync::Arc;

use super::client::RestClient;
use crate::domain::entities::NewComment;
use crate::domain::ports::CommentRepository;
use crate::error::DomainError;

pub struct RestCommentRepository {
    client: Arc<RestClient>,
}

impl RestCommentRepository {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommentRepository for RestCommentRepository {
    async fn create(&self, comment: &NewComment) -> Result<(), DomainError> {
        self.client.insert("comments", comment).await?;
        Ok(())
    }
}
