//! HTTP implementation of [`ExpenseApi`] backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::{ApiError, Expense, ExpenseApi, ExpenseUpdate, NewExpense, User};
use crate::config::Config;

/// JSON-over-HTTP client for the expense API.
///
/// Requests time out after the configured duration and every failure is
/// normalized into an [`ApiError`].
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    /// Append path segments to the base URL, keeping any base path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::network(format!("base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(request.send().await?).await?;
        response.json::<T>().await.map_err(ApiError::from)
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), url = %url, "Request failed");
        Err(ApiError::from_status(status.as_u16(), &body))
    }
}

#[async_trait]
impl ExpenseApi for HttpClient {
    async fn find_users(&self, username: &str) -> Result<Vec<User>, ApiError> {
        let mut url = self.endpoint(&["users"])?;
        url.query_pairs_mut().append_pair("username", username);
        self.send_json(self.http.get(url)).await
    }

    async fn list_expenses(&self) -> Result<Vec<Expense>, ApiError> {
        let url = self.endpoint(&["expenses"])?;
        self.send_json(self.http.get(url)).await
    }

    async fn get_expense(&self, id: &str) -> Result<Expense, ApiError> {
        let url = self.endpoint(&["expenses", id])?;
        self.send_json(self.http.get(url)).await
    }

    async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ApiError> {
        let url = self.endpoint(&["expenses"])?;
        self.send_json(self.http.post(url).json(expense)).await
    }

    async fn update_expense(&self, id: &str, update: &ExpenseUpdate) -> Result<Expense, ApiError> {
        let url = self.endpoint(&["expenses", id])?;
        self.send_json(self.http.put(url).json(update)).await
    }

    async fn delete_expense(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["expenses", id])?;
        Self::check(self.http.delete(url).send().await?).await?;
        Ok(())
    }
}
