//! HTTP client wrapper for the complaint API.
//!
//! One [`ApiClient`] is built per process from [`ApiConfig`]. Every request
//! goes through the same pipeline:
//! - [`hooks::authorize`] attaches the stored bearer token
//! - the request is sent once, bounded by the configured timeout
//! - [`hooks::observe_status`] clears the session on a 401
//! - non-success statuses become [`ClientError`]s
//!
//! There is no retry, backoff, or caching.

pub mod hooks;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::session::Session;

/// Shared, cheaply cloneable API client.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Arc<str>,
    client: Client,
    session: Arc<Session>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<Session>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("complaintdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Resolve an attachment reference from a complaint to a fetchable URL.
    pub fn attachment_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            self.url(reference)
        }
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    /// Send a request through the auth hooks. Non-success statuses are
    /// returned as errors after the response hook has run.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = hooks::authorize(request, &self.session).build()?;
        debug!(
            method = %request.method(),
            path = %request.url().path(),
            "Sending API request"
        );

        let response = self.client.execute(request).await?;
        let status = response.status();
        hooks::observe_status(status, &self.session);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_response(status, &body);
        debug!(status = %status, error = %err, "API request failed");
        Err(err)
    }

    /// Send a request and decode a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.execute(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
