//! # HTTP Retrieval Utilities
//!
//! Asynchronous API client around `reqwest` with exponential backoff retries
//! and JSON response decoding. Non-2xx responses are returned, not raised, so
//! callers decide how to treat them.

use reqwest::{
    header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE},
    Method, Url,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Serialize};

/// Retries applied to transient failures (connect errors, 5xx, 429).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Decoded response plus transaction metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The deserialized body, present on success.
    pub data: Option<T>,
    /// The raw body returned with a failing status.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Whether the status was in the 2xx range.
    pub success: bool,
    /// Response headers.
    pub headers: HeaderMap,
}

/// A flexible asynchronous HTTP client.
///
/// Relative paths are joined onto `base_url`; an optional bearer token is sent
/// with every request.
pub struct ApiClient {
    inner: ClientWithMiddleware,
    base_url: Url,
    auth_token: Option<String>,
}

impl ApiClient {
    /// Creates a client with [`DEFAULT_MAX_RETRIES`] retries.
    ///
    /// # Errors
    /// Fails if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, auth_token: Option<String>) -> anyhow::Result<Self> {
        Self::with_retries(base_url, auth_token, DEFAULT_MAX_RETRIES)
    }

    /// Creates a client with an explicit retry budget.
    pub fn with_retries(base_url: &str, auth_token: Option<String>, max_retries: u32) -> anyhow::Result<Self> {
        let url = Url::parse(base_url)?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            inner: client,
            base_url: url,
            auth_token,
        })
    }

    /// Builds the absolute URL for `path` with `query` appended.
    pub fn url_for(&self, path: &str, query: &[(&str, &str)]) -> anyhow::Result<Url> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    /// Performs a request and decodes a JSON body on success.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be built, the request cannot be
    /// sent, or a successful body is not valid JSON for `T`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        headers: Option<HeaderMap>,
        body: Option<B>,
    ) -> anyhow::Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let full_url = self.url_for(path, query)?;
        let mut req = self.inner.request(method, full_url);

        if let Some(h) = headers {
            req = req.headers(h);
        }
        if let Some(token) = &self.auth_token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(b) = body {
            let json_body = serde_json::to_string(&b)?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();

        if status.is_success() {
            let data = response.json::<T>().await?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }

    /// GET `path` with `query`, no body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<ApiResponse<T>> {
        self.request::<T, ()>(Method::GET, path, query, None, None).await
    }
}
