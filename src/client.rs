//! HTTP transport used by the measurers
//!
//! Every network call of a run goes through the [`HttpClient`] trait so the
//! engine can be driven by a scripted transport in tests.


use crate::{
    defaults::USER_AGENT,
    error::{AppError, Result},
};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Method};
use std::time::Duration;

/// HTTP client trait for abstraction and testing
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a HEAD request; only the status is returned
    async fn head(&self, url: &str, timeout: Duration) -> Result<HttpResponse>;

    /// Start a streaming GET; the body is delivered as chunk sizes
    async fn get_stream(&self, url: &str, timeout: Duration) -> Result<DownloadStream>;

    /// POST `body` and wait for the response status
    async fn post(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<HttpResponse>;
}

/// Status of a completed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
}

impl HttpResponse {
    pub fn new(status_code: u16) -> Self {
        Self { status_code }
    }

    /// Check if the response indicates success
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// A response whose body is consumed incrementally
///
/// Chunks are reported by length only; the payload bytes are dropped as soon
/// as they arrive.
pub struct DownloadStream {
    pub status_code: u16,

    /// Total size if the server advertised one
    pub content_length: Option<u64>,

    pub chunks: BoxStream<'static, Result<usize>>,
}

impl DownloadStream {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl std::fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStream")
            .field("status_code", &self.status_code)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// `reqwest`-backed implementation of [`HttpClient`]
#[derive(Debug, Clone)]
pub struct NetworkClient {
    client: Client,
}

impl NetworkClient {
    /// Create a new network client
    pub fn new() -> Result<Self> {
        Self::with_user_agent(USER_AGENT)
    }

    /// Create a network client sending a custom user agent
    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn send(&self, method: Method, url: &str, body: Option<Vec<u8>>, timeout: Duration) -> Result<reqwest::Response> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| AppError::parse(format!("Invalid URL '{}': {}", url, e)))?;

        let mut request = self.client.request(method, url).timeout(timeout);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(body);
        }

        request.send().await.map_err(AppError::from)
    }
}

#[async_trait]
impl HttpClient for NetworkClient {
    async fn head(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        let response = self.send(Method::HEAD, url, None, timeout).await?;
        Ok(HttpResponse::new(response.status().as_u16()))
    }

    async fn get_stream(&self, url: &str, timeout: Duration) -> Result<DownloadStream> {
        let response = self.send(Method::GET, url, None, timeout).await?;
        let status_code = response.status().as_u16();
        let content_length = response.content_length();

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.len()).map_err(AppError::from))
            .boxed();

        Ok(DownloadStream {
            status_code,
            content_length,
            chunks,
        })
    }

    async fn post(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<HttpResponse> {
        let response = self.send(Method::POST, url, Some(body), timeout).await?;
        Ok(HttpResponse::new(response.status().as_u16()))
    }
}
