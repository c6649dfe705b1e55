//! reqwest-backed JSON transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::HttpConfig;

use super::{JsonTransport, QueryParams, SourceError};

/// HTTP transport shared by both sources.
///
/// Retries 429 and 5xx responses up to `retries` times, sleeping
/// `retry_backoff_ms * attempt` in between. Connection errors and timeouts
/// are not retried.
pub struct HttpTransport {
    client: Client,
    retries: u32,
    backoff: Duration,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::ConnectionFailed(format!("HTTP client setup: {}", e)))?;

        Ok(Self {
            client,
            retries: config.retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn map_reqwest_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::ConnectionFailed(e.to_string())
    } else if e.is_decode() {
        SourceError::MalformedResponse(e.to_string())
    } else {
        SourceError::ConnectionFailed(e.to_string())
    }
}

#[async_trait]
impl JsonTransport for HttpTransport {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, SourceError> {
        let mut attempt = 0;

        loop {
            debug!(url = url, attempt = attempt, "GET");

            let response = self
                .client
                .get(url)
                .query(params)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status();
            if status.is_success() {
                let body = response.text().await.map_err(map_reqwest_error)?;
                return serde_json::from_str(&body).map_err(|e| {
                    SourceError::MalformedResponse(format!("API did not return valid JSON: {}", e))
                });
            }

            if is_retryable(status) && attempt < self.retries {
                attempt += 1;
                warn!(
                    url = url,
                    status = status.as_u16(),
                    attempt = attempt,
                    "Retrying request"
                );
                tokio::time::sleep(self.backoff * attempt).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
    }
}
