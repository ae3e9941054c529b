//! API gateway for communicating with the hrdesk REST backend.
//!
//! `ApiClient::call` is the raw, uninterpreted entry point: it attaches the
//! default headers and hands back whatever the transport produced. The
//! `get_json`/`send_json` helpers layer status checking and JSON decoding on
//! top so feature code can match on a `Result` instead of probing statuses.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend address used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Per-request configuration layered over the gateway defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<serde_json::Value>,
    /// Extra headers; a name present here replaces the default of that name.
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self::with_method(Method::POST)
    }

    pub fn put() -> Self {
        Self::with_method(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("body is not serializable: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Add or replace a header
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self, ApiError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid value for {}: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

/// Gateway to the hrdesk backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a gateway for `base_url` using the transport's default timeout
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    /// Same connection pool, no credentials.
    pub fn without_token(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    fn default_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("token contains invalid characters".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Merge caller headers over the defaults; caller values win.
    fn merged_headers(&self, extra: &HeaderMap) -> Result<HeaderMap, ApiError> {
        let mut headers = self.default_headers()?;
        for name in extra.keys() {
            headers.remove(name);
        }
        for (name, value) in extra {
            headers.append(name.clone(), value.clone());
        }
        Ok(headers)
    }

    /// Issue a request and return the raw response.
    ///
    /// Status codes are not interpreted here. A failure before any response
    /// arrived (DNS, refused connection, timeout) is `ApiError::Network`.
    pub async fn call(&self, endpoint: &str, options: RequestOptions) -> Result<Response, ApiError> {
        let url = self.url(endpoint);
        let headers = self.merged_headers(&options.headers)?;

        let mut request = self.client.request(options.method.clone(), &url).headers(headers);
        if let Some(ref body) = options.body {
            request = request.body(body.to_string());
        }

        debug!(method = %options.method, endpoint, authenticated = self.token.is_some(), "Sending request");
        let response = request.send().await?;
        debug!(method = %options.method, endpoint, status = %response.status(), "Response received");

        Ok(response)
    }

    /// GET `endpoint` and decode a 2xx JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.send_json(endpoint, RequestOptions::get()).await
    }

    /// Issue a request and decode a 2xx JSON body, mapping everything else
    /// to an `ApiError`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.call(endpoint, options).await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, endpoint).await
    }

    /// Check if response is successful, returning an error with body if not.
    pub async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    pub(crate) async fn parse_json<T: DeserializeOwned>(
        response: Response,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::undecodable(endpoint, &e))
    }
}
