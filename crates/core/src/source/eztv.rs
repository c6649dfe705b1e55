//! EZTV tracker adapter: latest, per-show and top-seeded listings.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EztvConfig;
use crate::extract::{extract_resolution, extract_year, format_size, normalize_date};
use crate::magnet::{build_magnet_link, is_magnet_uri};
use crate::record::{normalize_all, ExtractError, NormalizedRecord, RawResult, Source};

use super::tpb::json_kind;
use super::{param, JsonTransport, QueryParams, SourceError};

/// Client for the EZTV `get-torrents` endpoint.
pub struct EztvClient {
    transport: Arc<dyn JsonTransport>,
    base_url: String,
    page_size: usize,
    max_pages: u32,
}

impl EztvClient {
    pub fn new(config: &EztvConfig, transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            page_size: config.page_size.max(1) as usize,
            max_pages: config.max_pages.max(1),
        }
    }

    /// Most recent torrents, starting at `page` (1-based).
    pub async fn fetch_latest(
        &self,
        limit: usize,
        page: u32,
    ) -> Result<Vec<RawResult>, SourceError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.fetch_pages(Vec::new(), page.max(1), Some(limit)).await
    }

    /// Every torrent of one show, following pages until exhausted.
    pub async fn fetch_show(&self, imdb_id: &str) -> Result<Vec<RawResult>, SourceError> {
        let imdb_id = parse_imdb_id(imdb_id)?;
        debug!(imdb_id = %imdb_id, "Fetching EZTV show");
        self.fetch_pages(vec![param("imdb_id", imdb_id)], 1, None)
            .await
    }

    pub async fn latest(
        &self,
        limit: usize,
        page: u32,
    ) -> Result<Vec<NormalizedRecord>, SourceError> {
        let raw = self.fetch_latest(limit, page).await?;
        Ok(normalize_all(Source::Eztv, raw, normalize_eztv))
    }

    /// Torrents of one show; with `season`, only that season's episodes.
    pub async fn show(
        &self,
        imdb_id: &str,
        season: Option<u32>,
    ) -> Result<Vec<NormalizedRecord>, SourceError> {
        let raw = self.fetch_show(imdb_id).await?;
        let mut records = normalize_all(Source::Eztv, raw, normalize_eztv);
        if let Some(season) = season {
            records.retain(|r| r.season == Some(season));
        }
        Ok(records)
    }

    /// The first `limit_fetch` latest torrents, to be ranked by seeds.
    pub async fn top_candidates(
        &self,
        limit_fetch: usize,
    ) -> Result<Vec<NormalizedRecord>, SourceError> {
        self.latest(limit_fetch, 1).await
    }

    /// Request consecutive pages until `wanted` results are collected, a
    /// page comes back short, or `max_pages` requests were made. Results
    /// repeated across pages (the listing shifts while paging) are kept once.
    async fn fetch_pages(
        &self,
        base: QueryParams,
        first_page: u32,
        wanted: Option<usize>,
    ) -> Result<Vec<RawResult>, SourceError> {
        let per_page = wanted.map_or(self.page_size, |w| w.min(self.page_size));
        let mut collected: Vec<RawResult> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page in first_page..first_page.saturating_add(self.max_pages) {
            let mut params = base.clone();
            params.push(param("limit", per_page));
            params.push(param("page", page));

            let body = self.transport.get_json(&self.base_url, &params).await?;
            let items = parse_torrents_response(body)?;
            let received = items.len();
            debug!(page = page, results = received, "EZTV page fetched");

            for item in items {
                if let Some(key) = dedup_key(&item) {
                    if !seen.insert(key) {
                        continue;
                    }
                }
                collected.push(item);
            }

            let enough = wanted.is_some_and(|w| collected.len() >= w);
            if enough || received < per_page {
                break;
            }
        }

        if let Some(wanted) = wanted {
            collected.truncate(wanted);
        }
        Ok(collected)
    }
}

fn dedup_key(item: &RawResult) -> Option<String> {
    item.text("hash")
        .map(|h| h.trim().to_lowercase())
        .or_else(|| item.text("id"))
}

/// EZTV wraps results in `{"torrents": [...], ...}`; the key is missing or
/// null when nothing matched.
fn parse_torrents_response(body: Value) -> Result<Vec<RawResult>, SourceError> {
    let mut envelope = match body {
        Value::Object(envelope) => envelope,
        other => {
            return Err(SourceError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let items = match envelope.remove("torrents") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(SourceError::MalformedResponse(format!(
                "expected 'torrents' to be an array, got {}",
                json_kind(&other)
            )))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match RawResult::from_value(item) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(source = "eztv", error = %e, "Skipping result");
                None
            }
        })
        .collect())
}

/// Accepts `tt0944947` or `0944947` and returns the digits.
pub fn parse_imdb_id(input: &str) -> Result<String, SourceError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("tt")
        .or_else(|| trimmed.strip_prefix("TT"))
        .unwrap_or(trimmed);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SourceError::InvalidQuery(format!(
            "'{}' is not an IMDb id",
            input
        )));
    }

    Ok(digits.to_string())
}

/// Map one EZTV result to a record.
///
/// Uses `title`, `seeds`, `peers`, `size_bytes`, `date_released_unix`,
/// `season`, `episode`, `id`, and `magnet_url` (falling back to a link built
/// from `hash`).
pub fn normalize_eztv(raw: &RawResult) -> Result<NormalizedRecord, ExtractError> {
    let title = raw.text("title").ok_or(ExtractError::MissingTitle)?;
    let seeds = raw.count("seeds")?.unwrap_or(0);

    let magnet_link = raw
        .text("magnet_url")
        .map(|uri| uri.trim().to_string())
        .filter(|uri| is_magnet_uri(uri))
        .or_else(|| {
            raw.text("hash")
                .and_then(|hash| build_magnet_link(&hash, &title))
        });

    let date = raw
        .get("date_released_unix")
        .and_then(normalize_date)
        .or_else(|| raw.get("date_released").and_then(normalize_date));

    Ok(NormalizedRecord {
        source: Source::Eztv,
        year: extract_year(&title),
        resolution: extract_resolution(&title),
        seeders: seeds,
        leechers: raw.count_lenient("peers").unwrap_or(0),
        size: format_size(raw.count_lenient("size_bytes").unwrap_or(0)),
        date,
        uploader: None,
        id: raw.text("id"),
        season: small_count(raw, "season"),
        episode: small_count(raw, "episode"),
        magnet_link,
        title,
    })
}

fn small_count(raw: &RawResult, key: &'static str) -> Option<u32> {
    raw.count_lenient(key).and_then(|n| u32::try_from(n).ok())
}
