//! Mock JSON transport for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{JsonTransport, QueryParams, SourceError};

/// A recorded request for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub params: QueryParams,
}

impl RecordedRequest {
    /// Value of the first parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Mock implementation of the JsonTransport trait.
///
/// Queued responses are returned in order, one per request. Once the queue
/// is empty the fallback response is used; without one the request fails
/// with `SourceError::ConnectionFailed`.
///
/// # Example
///
/// ```rust,ignore
/// use torrent_api_core::testing::MockTransport;
///
/// let transport = MockTransport::new();
/// transport.push_json(json!([{"name": "Movie.2019.1080p", "seeders": "10"}])).await;
///
/// let client = TpbClient::new(&TpbConfig::default(), Arc::new(transport.clone()));
/// let records = client.search("movie", TpbCategory::Movies, 50).await?;
///
/// let requests = transport.recorded_requests().await;
/// assert_eq!(requests[0].param("q"), Some("movie"));
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<RwLock<VecDeque<Result<Value, SourceError>>>>,
    fallback: Arc<RwLock<Option<Value>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("responses", &"<responses>")
            .field("fallback", &"<fallback>")
            .field("requests", &"<requests>")
            .finish()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful JSON response.
    pub async fn push_json(&self, body: Value) {
        self.responses.write().await.push_back(Ok(body));
    }

    /// Queue a failure.
    pub async fn push_error(&self, error: SourceError) {
        self.responses.write().await.push_back(Err(error));
    }

    /// Answer every request past the queue with `body`.
    pub async fn set_fallback(&self, body: Value) {
        *self.fallback.write().await = Some(body);
    }

    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl JsonTransport for MockTransport {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, SourceError> {
        self.requests.write().await.push(RecordedRequest {
            url: url.to_string(),
            params: params.clone(),
        });

        if let Some(response) = self.responses.write().await.pop_front() {
            return response;
        }

        match self.fallback.read().await.clone() {
            Some(body) => Ok(body),
            None => Err(SourceError::ConnectionFailed(
                "no mock response queued".to_string(),
            )),
        }
    }
}
