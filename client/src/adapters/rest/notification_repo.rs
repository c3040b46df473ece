//! REST adapter for NotificationRepository

use async_trait::async_trait;
use std::sync::Arc;

use super::client::RestClient;
use crate::domain::entities::NewNotification;
use crate::domain::ports::NotificationRepository;
use crate::error::DomainError;

pub struct RestNotificationRepository {
    client: Arc<RestClient>,
}

impl RestNotificationRepository {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationRepository for RestNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> Result<(), DomainError> {
        self.client.insert("notifications", notification).await?;
        Ok(())
    }
}
