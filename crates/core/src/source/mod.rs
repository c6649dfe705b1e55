//! Upstream metadata sources.
//!
//! Each adapter (TPB, EZTV) turns a query into the full list of raw results
//! through a [`JsonTransport`], then normalizes them into
//! [`NormalizedRecord`](crate::record::NormalizedRecord)s.

mod eztv;
mod http;
mod tpb;

pub use eztv::{normalize_eztv, parse_imdb_id, EztvClient};
pub use http::HttpTransport;
pub use tpb::{normalize_tpb, TpbCategory, TpbClient};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that abort a fetch. No partial output is produced after one.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Query parameters as ordered key/value pairs.
pub type QueryParams = Vec<(String, String)>;

/// Issues a GET and decodes the body as JSON.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, SourceError>;
}

pub(crate) fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}
