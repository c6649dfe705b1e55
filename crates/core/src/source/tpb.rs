//! TPB index (apibay) search adapter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TpbConfig;
use crate::extract::{extract_resolution, extract_year, format_size, normalize_date};
use crate::magnet::build_magnet_link;
use crate::record::{normalize_all, ExtractError, NormalizedRecord, RawResult, Source};

use super::{param, JsonTransport, SourceError};

/// Name of the placeholder entry apibay returns instead of an empty array.
const NO_RESULTS_SENTINEL: &str = "No results returned";

/// Searchable TPB categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TpbCategory {
    /// HD - Movies
    Movies,
    /// HD - TV shows
    Tv,
}

impl TpbCategory {
    /// apibay category id.
    pub fn code(&self) -> u32 {
        match self {
            TpbCategory::Movies => 207,
            TpbCategory::Tv => 208,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TpbCategory::Movies => "movies",
            TpbCategory::Tv => "tv",
        }
    }
}

/// Client for the apibay JSON search endpoint.
pub struct TpbClient {
    transport: Arc<dyn JsonTransport>,
    base_url: String,
}

impl TpbClient {
    pub fn new(config: &TpbConfig, transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
        }
    }

    /// Fetch raw results for `query`, truncated to `limit`.
    pub async fn fetch(
        &self,
        query: &str,
        category: TpbCategory,
        limit: usize,
    ) -> Result<Vec<RawResult>, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SourceError::InvalidQuery("search query is empty".to_string()));
        }

        let params = vec![param("q", query), param("cat", category.code())];
        debug!(query = query, category = category.label(), "Searching TPB");

        let body = self.transport.get_json(&self.base_url, &params).await?;
        let mut results = parse_search_response(body)?;
        results.truncate(limit);

        debug!(results = results.len(), "TPB search complete");
        Ok(results)
    }

    /// Fetch and normalize; records failing extraction are dropped.
    pub async fn search(
        &self,
        query: &str,
        category: TpbCategory,
        limit: usize,
    ) -> Result<Vec<NormalizedRecord>, SourceError> {
        let raw = self.fetch(query, category, limit).await?;
        Ok(normalize_all(Source::Tpb, raw, normalize_tpb))
    }
}

/// Accepts an array of results, a single result object, or the no-results
/// forms (a bare string, or the sentinel entry).
fn parse_search_response(body: Value) -> Result<Vec<RawResult>, SourceError> {
    let items = match body {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        Value::String(_) => return Ok(Vec::new()),
        other => {
            return Err(SourceError::MalformedResponse(format!(
                "expected a JSON array of results, got {}",
                json_kind(&other)
            )))
        }
    };

    let is_sentinel = items
        .first()
        .and_then(|first| first.get("name"))
        .and_then(Value::as_str)
        .is_some_and(|name| name == NO_RESULTS_SENTINEL);
    if is_sentinel {
        return Ok(Vec::new());
    }

    Ok(items
        .into_iter()
        .filter_map(|item| match RawResult::from_value(item) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(source = "tpb", error = %e, "Skipping result");
                None
            }
        })
        .collect())
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Map one apibay result to a record.
///
/// apibay delivers every field as a string: `name`, `info_hash`, `seeders`,
/// `leechers`, `size` (bytes), `added` (Unix seconds), `username`, `id`.
pub fn normalize_tpb(raw: &RawResult) -> Result<NormalizedRecord, ExtractError> {
    let title = raw.text("name").ok_or(ExtractError::MissingTitle)?;
    let seeders = raw.count("seeders")?.unwrap_or(0);

    let magnet_link = raw
        .text("info_hash")
        .and_then(|hash| build_magnet_link(&hash, &title));

    Ok(NormalizedRecord {
        source: Source::Tpb,
        year: extract_year(&title),
        resolution: extract_resolution(&title),
        seeders,
        leechers: raw.count_lenient("leechers").unwrap_or(0),
        size: format_size(raw.count_lenient("size").unwrap_or(0)),
        date: raw.get("added").and_then(normalize_date),
        uploader: raw.text("username"),
        id: raw.text("id"),
        season: None,
        episode: None,
        magnet_link,
        title,
    })
}
