//! REST client for the hosted backend

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::query::Query;
use crate::config::Config;
use crate::error::BackendError;

/// Thin client over the backend's `/rest/v1` table endpoints
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: String,
}

impl RestClient {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
    }

    /// Select rows as loosely-typed JSON; callers convert them at the boundary
    pub async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError> {
        tracing::debug!("GET {} {:?}", table, query.params());
        let response = self
            .request(reqwest::Method::GET, table)
            .query(query.params())
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<(), BackendError> {
        tracing::debug!("POST {}", table);
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// Insert one row and return the requested columns of the stored row
    pub async fn insert_returning<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
        columns: &str,
    ) -> Result<Vec<Value>, BackendError> {
        tracing::debug!("POST {} returning {}", table, columns);
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .query(&[("select", columns)])
            .json(row)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn delete(&self, table: &str, query: &Query) -> Result<(), BackendError> {
        tracing::debug!("DELETE {} {:?}", table, query.params());
        let response = self
            .request(reqwest::Method::DELETE, table)
            .query(query.params())
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| BackendError::Deserialization(e.to_string()))
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), BackendError> {
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}

/// Map a failed response to its error; the body becomes the message
async fn status_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    error_for_status(status, message)
}

fn error_for_status(status: u16, message: String) -> BackendError {
    match status {
        401 => BackendError::Unauthorized,
        429 => BackendError::RateLimited,
        status => BackendError::Api { status, message },
    }
}
