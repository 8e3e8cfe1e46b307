//! Ways of reaching the registry API.
//!
//! A [`Transport`] sends one authenticated GET and hands back the raw status
//! and body. Interpreting the answer is left to [`crate::ZedClient`], so every
//! transport yields the same normalized results.

use std::future::Future;
use std::time::Duration;

use paddock_core::AppError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

/// Status and body of an HTTP answer, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One route to the registry API (a proxy, or the API itself).
pub trait Transport: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Sends `GET <base>/<segments...>?<query>` with a bearer token.
    ///
    /// Only failures without an HTTP answer are errors; non-2xx statuses are
    /// returned as a [`RawResponse`].
    fn get(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        token: &str,
    ) -> impl Future<Output = Result<RawResponse, AppError>> + Send;
}

/// [`Transport`] over `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    name: String,
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Creates a transport rooted at `base_url_str`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if the URL is invalid or cannot carry
    /// a path, `AppError::NetworkFailure` if the HTTP client cannot be built.
    pub fn new(name: &str, base_url_str: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url_str)
            .map_err(|_| AppError::InvalidInput(format!("Invalid API URL: {}", base_url_str)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InvalidInput(format!(
                "Invalid API URL: {}",
                base_url_str
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("paddock/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::NetworkFailure(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        token: &str,
    ) -> Result<RawResponse, AppError> {
        let url = self.url_for(segments, query);

        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout
    } else {
        AppError::NetworkFailure(e.to_string())
    }
}
