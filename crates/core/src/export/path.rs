use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level folder under the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputCategory {
    Movies,
    Tv,
}

impl OutputCategory {
    pub fn dir_name(&self) -> &'static str {
        match self {
            OutputCategory::Movies => "Movies",
            OutputCategory::Tv => "TV_Shows",
        }
    }
}

/// Where one command's CSV goes: `<dir>/<category>/<prefix>[_<timestamp>].csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub category: OutputCategory,
    pub prefix: String,
}

impl OutputPlan {
    pub fn new(category: OutputCategory, prefix: impl Into<String>) -> Self {
        Self {
            category,
            prefix: prefix.into(),
        }
    }

    /// Directory the file lands in.
    pub fn dir(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.category.dir_name())
    }

    /// Full file path; a timestamp makes the name unique per run.
    pub fn file_path(&self, output_dir: &Path, timestamp: Option<DateTime<Utc>>) -> PathBuf {
        let name = match timestamp {
            Some(ts) => format!("{}_{}.csv", self.prefix, ts.format("%Y-%m-%d_%H-%M-%S")),
            None => format!("{}.csv", self.prefix),
        };
        self.dir(output_dir).join(name)
    }
}

/// Collapse every run of characters other than letters, digits, `_` and `-`
/// into a single `_`. Letters and digits are Unicode-aware.
pub fn safe_filename(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    let mut in_run = false;

    for c in value.chars() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            cleaned.push(c);
            in_run = false;
        } else if !in_run {
            cleaned.push('_');
            in_run = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "results".to_string()
    } else {
        trimmed.to_string()
    }
}
