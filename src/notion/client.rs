/// Notion HTTP client implementation.
///
/// This module provides `NotionClient` for making synchronous HTTP requests to the
/// Notion API, along with the error type and builder used to configure it.
use std::time::Duration;

use log::debug;
use reqwest::blocking::RequestBuilder;
use serde_json::Value;
use thiserror::Error;

use super::wire::{self, QueryPage, QueryRequest};
use crate::codec::ExternalRecord;
use crate::models::PageId;

const DEFAULT_BASE_URL: &str = "https://api.notion.com";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Errors that can occur when talking to the Notion API.
#[derive(Debug, Error)]
pub enum NotionError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Error object returned by the API with a non-success status
    #[error("Notion API error (status {status}, {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A success response that is missing expected fields
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No integration token was configured
    #[error("NOTION_API_KEY is not set")]
    MissingApiKey,
}

impl NotionError {
    /// Returns the API's error message, if this is an API error.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }

    /// Builds an `Api` error from a failed response body.
    fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .map(String::from)
        };

        Self::Api {
            status,
            code: field("code").unwrap_or_else(|| "unknown".to_string()),
            message: field("message").unwrap_or_else(|| body.trim().to_string()),
        }
    }
}

/// Builder for constructing `NotionClient` instances.
///
/// # Examples
///
/// ```
/// use quiznote::notion::NotionClientBuilder;
///
/// let client = NotionClientBuilder::new()
///     .api_key("secret_example")
///     .base_url("https://api.notion.com")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Default)]
pub struct NotionClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    notion_version: Option<String>,
}

impl NotionClientBuilder {
    /// Creates a new `NotionClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the integration token used for `Authorization: Bearer`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for the Notion API.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL (e.g., "https://api.notion.com")
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the `Notion-Version` header value.
    pub fn notion_version(mut self, version: impl Into<String>) -> Self {
        self.notion_version = Some(version.into());
        self
    }

    /// Builds the `NotionClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// Each setting not given to the builder is read from the environment:
    /// `NOTION_API_KEY` (required), `NOTION_BASE_URL` (defaults to
    /// `https://api.notion.com`) and `NOTION_VERSION` (defaults to `2022-06-28`).
    ///
    /// # Errors
    ///
    /// Returns `NotionError::MissingApiKey` when no token is available and
    /// `NotionError::InvalidUrl` when the base URL does not parse.
    pub fn build(self) -> Result<NotionClient, NotionError> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("NOTION_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(NotionError::MissingApiKey)?;

        let base_url = self
            .base_url
            .or_else(|| std::env::var("NOTION_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let notion_version = self
            .notion_version
            .or_else(|| std::env::var("NOTION_VERSION").ok())
            .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string());

        reqwest::Url::parse(&base_url)
            .map_err(|e| NotionError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(NotionError::Network)?;

        Ok(NotionClient {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            notion_version,
        })
    }
}

/// Synchronous HTTP client for the Notion API.
///
/// Each call blocks until the response arrives. Failed requests are not
/// retried; the caller decides whether to try again.
pub struct NotionClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    notion_version: String,
}

/// Record operations the note store needs from the external database.
///
/// This trait enables swapping the HTTP client for an in-memory store or a
/// test double.
pub trait NotionClientTrait: Send + Sync {
    /// Creates a page in `database_id` and returns its id.
    fn create_page(
        &self,
        database_id: &str,
        properties: &ExternalRecord,
    ) -> Result<PageId, NotionError>;

    /// Overwrites the given properties of an existing page.
    fn update_page(
        &self,
        page_id: &PageId,
        properties: &ExternalRecord,
    ) -> Result<PageId, NotionError>;

    /// Fetches one page of results from `database_id`.
    fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryPage, NotionError>;
}

impl NotionClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the API version sent with every request.
    pub fn notion_version(&self) -> &str {
        &self.notion_version
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.notion_version)
    }

    /// Sends a request and returns the parsed JSON body of a success response.
    fn send(&self, request: RequestBuilder) -> Result<Value, NotionError> {
        let response = self
            .authorized(request)
            .send()
            .map_err(NotionError::from_transport)?;

        let status = response.status();
        let body = response.text().map_err(NotionError::from_transport)?;

        if !status.is_success() {
            return Err(NotionError::from_response(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(NotionError::Serialization)
    }
}

impl NotionClientTrait for NotionClient {
    fn create_page(
        &self,
        database_id: &str,
        properties: &ExternalRecord,
    ) -> Result<PageId, NotionError> {
        let url = format!("{}/v1/pages", self.base_url);
        let body = serde_json::json!({
            "parent": { "database_id": database_id },
            "properties": wire::properties_to_json(properties),
        });
        debug!("POST {url} ({} properties)", properties.len());

        let response = self.send(self.client.post(&url).json(&body))?;
        wire::page_id_from_json(&response)
    }

    fn update_page(
        &self,
        page_id: &PageId,
        properties: &ExternalRecord,
    ) -> Result<PageId, NotionError> {
        let url = format!("{}/v1/pages/{}", self.base_url, page_id);
        let body = serde_json::json!({
            "properties": wire::properties_to_json(properties),
        });
        debug!("PATCH {url} ({} properties)", properties.len());

        let response = self.send(self.client.patch(&url).json(&body))?;
        wire::page_id_from_json(&response)
    }

    fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryPage, NotionError> {
        let url = format!("{}/v1/databases/{}/query", self.base_url, database_id);
        debug!(
            "POST {url} (page_size {}, cursor {:?})",
            request.page_size, request.start_cursor
        );

        let response = self.send(self.client.post(&url).json(&wire::query_body(request)))?;
        wire::query_page_from_json(&response)
    }
}
