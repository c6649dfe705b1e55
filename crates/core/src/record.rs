//! Raw upstream results and the normalized record schema.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Which upstream API a record came from.
///
/// The source selects the CSV columns and the ranking comparator
/// (see [`crate::ranker`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Tpb,
    Eztv,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Tpb => "tpb",
            Source::Eztv => "eztv",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Video resolution inferred from a release title.
///
/// Variants are declared lowest first so the derived ordering follows
/// [`Resolution::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resolution {
    Unknown,
    Sd,
    Hd720,
    FullHd1080,
    Uhd2160,
}

impl Resolution {
    /// Sort rank: 2160p=4, 1080p=3, 720p=2, SD=1, unknown=0.
    pub fn rank(&self) -> u8 {
        match self {
            Resolution::Unknown => 0,
            Resolution::Sd => 1,
            Resolution::Hd720 => 2,
            Resolution::FullHd1080 => 3,
            Resolution::Uhd2160 => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Unknown => "unknown",
            Resolution::Sd => "SD",
            Resolution::Hd720 => "720p",
            Resolution::FullHd1080 => "1080p",
            Resolution::Uhd2160 => "2160p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized torrent listing, ready for ranking and export.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub source: Source,
    pub title: String,
    pub year: Option<u16>,
    pub resolution: Resolution,
    /// Seeders (TPB) or seeds (EZTV).
    pub seeders: u64,
    /// Leechers (TPB) or peers (EZTV).
    pub leechers: u64,
    /// Human-readable size, e.g. `1.37 GB`.
    pub size: String,
    /// Upload date (TPB) or release date (EZTV) as `YYYY-MM-DD`.
    pub date: Option<String>,
    pub uploader: Option<String>,
    pub id: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub magnet_link: Option<String>,
}

/// Per-record extraction failures. The record is dropped, the batch continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("result has no title")]
    MissingTitle,

    #[error("field '{field}' is not a non-negative integer: {value}")]
    InvalidCount { field: &'static str, value: String },

    #[error("result is not a JSON object: {0}")]
    NotAnObject(String),
}

/// One result object exactly as the upstream API returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult(Map<String, Value>);

impl RawResult {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, rejecting anything but an object.
    pub fn from_value(value: Value) -> Result<Self, ExtractError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ExtractError::NotAnObject(truncate(&other.to_string()))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Read a field as text, unchanged. Numbers are rendered in decimal;
    /// null, blank and non-scalar values are absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => (!s.trim().is_empty()).then(|| s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Read a non-negative integer delivered either as a JSON number or as
    /// a numeric string. Missing, null and empty values are `Ok(None)`.
    pub fn count(&self, key: &'static str) -> Result<Option<u64>, ExtractError> {
        let invalid = |value: &Value| ExtractError::InvalidCount {
            field: key,
            value: truncate(&value.to_string()),
        };

        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(value)),
            Some(value @ Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    trimmed.parse::<u64>().map(Some).map_err(|_| invalid(value))
                }
            }
            Some(value) => Err(invalid(value)),
        }
    }

    /// Like [`RawResult::count`], but a malformed value reads as absent.
    pub fn count_lenient(&self, key: &'static str) -> Option<u64> {
        self.count(key).ok().flatten()
    }
}

impl From<Map<String, Value>> for RawResult {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Run `normalize` over every raw result, dropping (and logging) the ones
/// that fail extraction. Input order is preserved.
pub fn normalize_all<F>(source: Source, raw: Vec<RawResult>, normalize: F) -> Vec<NormalizedRecord>
where
    F: Fn(&RawResult) -> Result<NormalizedRecord, ExtractError>,
{
    let total = raw.len();
    let records: Vec<_> = raw
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match normalize(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(source = %source, index, error = %e, "Dropping result");
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!(
            source = %source,
            dropped = total - records.len(),
            kept = records.len(),
            "Some results failed extraction"
        );
    }

    records
}

fn truncate(s: &str) -> String {
    s.chars().take(80).collect()
}
