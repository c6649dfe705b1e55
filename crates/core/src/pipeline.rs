//! One command end to end: fetch, normalize, filter, rank.
//!
//! `collect` stops at ranked records and their output plan. `fetch_and_export`
//! adds the write, touching the filesystem only after the whole fetch
//! succeeded.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::export::{
    safe_filename, write_records, ExportError, OutputCategory, OutputPlan, WriteMode,
};
use crate::ranker::{rank, retain_min_resolution, top_by_seeders};
use crate::record::{NormalizedRecord, Resolution, Source};
use crate::source::{EztvClient, HttpTransport, JsonTransport, SourceError, TpbCategory, TpbClient};

/// A single fetch-and-export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCommand {
    /// Search TPB; ranked by seeders.
    TpbSearch {
        query: String,
        category: TpbCategory,
        limit: usize,
    },
    /// Latest EZTV uploads, kept in upstream (newest first) order.
    EztvLatest {
        limit: usize,
        page: u32,
        min_1080p: bool,
    },
    /// Every EZTV torrent of a show; ranked by season/episode/resolution/seeds.
    EztvShow {
        imdb_id: String,
        show_name: String,
        season: Option<u32>,
        min_1080p: bool,
    },
    /// The best-seeded of the latest `limit_fetch` EZTV uploads.
    EztvTop {
        limit_fetch: usize,
        top_n: usize,
        min_1080p: bool,
    },
}

impl FetchCommand {
    pub fn source(&self) -> Source {
        match self {
            FetchCommand::TpbSearch { .. } => Source::Tpb,
            _ => Source::Eztv,
        }
    }

    pub fn output_plan(&self) -> OutputPlan {
        match self {
            FetchCommand::TpbSearch {
                query, category, ..
            } => {
                let output_category = match category {
                    TpbCategory::Movies => OutputCategory::Movies,
                    TpbCategory::Tv => OutputCategory::Tv,
                };
                OutputPlan::new(
                    output_category,
                    format!("tpb_{}_{}", category.label(), safe_filename(query)),
                )
            }
            FetchCommand::EztvLatest { .. } => OutputPlan::new(OutputCategory::Tv, "eztv_latest"),
            FetchCommand::EztvShow {
                show_name,
                season,
                min_1080p,
                ..
            } => {
                let mut prefix = format!("eztv_{}", safe_filename(show_name));
                match season {
                    Some(season) => prefix.push_str(&format!("_S{:02}", season)),
                    None => prefix.push_str("_All"),
                }
                if *min_1080p {
                    prefix.push_str("_HQ");
                }
                OutputPlan::new(OutputCategory::Tv, prefix)
            }
            FetchCommand::EztvTop { top_n, .. } => {
                OutputPlan::new(OutputCategory::Tv, format!("eztv_top_{}_seeded", top_n))
            }
        }
    }
}

/// Both source adapters, sharing one transport.
pub struct Sources {
    pub tpb: TpbClient,
    pub eztv: EztvClient,
}

impl Sources {
    pub fn new(config: &Config, transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            tpb: TpbClient::new(&config.tpb, Arc::clone(&transport)),
            eztv: EztvClient::new(&config.eztv, transport),
        }
    }

    /// Sources backed by the HTTP transport.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let transport: Arc<dyn JsonTransport> = Arc::new(HttpTransport::new(&config.http)?);
        Ok(Self::new(config, transport))
    }
}

/// Ranked records of one command, ready for export.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub source: Source,
    pub records: Vec<NormalizedRecord>,
    pub plan: OutputPlan,
}

/// Fetch and prepare the records of `command`.
pub async fn collect(sources: &Sources, command: &FetchCommand) -> Result<RunOutput, SourceError> {
    let source = command.source();

    let records = match command {
        FetchCommand::TpbSearch {
            query,
            category,
            limit,
        } => {
            let mut records = sources.tpb.search(query, *category, *limit).await?;
            rank(source, &mut records);
            records
        }
        FetchCommand::EztvLatest {
            limit,
            page,
            min_1080p,
        } => {
            let mut records = sources.eztv.latest(*limit, *page).await?;
            apply_min_1080p(&mut records, *min_1080p);
            records
        }
        FetchCommand::EztvShow {
            imdb_id,
            season,
            min_1080p,
            ..
        } => {
            let mut records = sources.eztv.show(imdb_id, *season).await?;
            apply_min_1080p(&mut records, *min_1080p);
            rank(source, &mut records);
            records
        }
        FetchCommand::EztvTop {
            limit_fetch,
            top_n,
            min_1080p,
        } => {
            let mut records = sources.eztv.top_candidates(*limit_fetch).await?;
            apply_min_1080p(&mut records, *min_1080p);
            top_by_seeders(records, *top_n)
        }
    };

    info!(source = %source, records = records.len(), "Results ready");

    Ok(RunOutput {
        source,
        records,
        plan: command.output_plan(),
    })
}

/// Where a run's CSV goes and how an existing file is treated.
#[derive(Debug, Clone)]
pub struct ExportTarget {
    pub output_dir: PathBuf,
    /// Appended to the file name when set.
    pub timestamp: Option<DateTime<Utc>>,
    pub mode: WriteMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Write a collected run under `target`, creating the category directory.
pub fn export_run(
    output: &RunOutput,
    target: &ExportTarget,
) -> Result<ExportSummary, ExportError> {
    fs::create_dir_all(output.plan.dir(&target.output_dir))?;

    let path = output.plan.file_path(&target.output_dir, target.timestamp);
    let rows = write_records(&path, output.source, &output.records, target.mode)?;

    info!(rows = rows, path = %path.display(), "Export complete");
    Ok(ExportSummary { path, rows })
}

/// Run `command` end to end. A failed fetch leaves the output directory
/// untouched; a failed write leaves any previous file as it was.
pub async fn fetch_and_export(
    sources: &Sources,
    command: &FetchCommand,
    target: &ExportTarget,
) -> Result<ExportSummary, RunError> {
    let output = collect(sources, command).await?;
    Ok(export_run(&output, target)?)
}

fn apply_min_1080p(records: &mut Vec<NormalizedRecord>, enabled: bool) {
    if enabled {
        let before = records.len();
        retain_min_resolution(records, Resolution::FullHd1080);
        info!(
            removed = before - records.len(),
            kept = records.len(),
            "Filtered for 1080p+"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tpb_output_plan() {
        let command = FetchCommand::TpbSearch {
            query: "The Matrix".to_string(),
            category: TpbCategory::Movies,
            limit: 50,
        };
        assert_eq!(command.source(), Source::Tpb);
        assert_eq!(
            command.output_plan(),
            OutputPlan::new(OutputCategory::Movies, "tpb_movies_The_Matrix")
        );

        let command = FetchCommand::TpbSearch {
            query: "Severance".to_string(),
            category: TpbCategory::Tv,
            limit: 50,
        };
        assert_eq!(
            command.output_plan(),
            OutputPlan::new(OutputCategory::Tv, "tpb_tv_Severance")
        );
    }

    #[test]
    fn test_eztv_show_output_plan() {
        let command = FetchCommand::EztvShow {
            imdb_id: "1442462".to_string(),
            show_name: "The Good Wife".to_string(),
            season: Some(1),
            min_1080p: false,
        };
        assert_eq!(command.output_plan().prefix, "eztv_The_Good_Wife_S01");

        let command = FetchCommand::EztvShow {
            imdb_id: "1442462".to_string(),
            show_name: "The Good Wife".to_string(),
            season: None,
            min_1080p: true,
        };
        assert_eq!(command.output_plan().prefix, "eztv_The_Good_Wife_All_HQ");
    }

    #[test]
    fn test_eztv_latest_and_top_output_plans() {
        let latest = FetchCommand::EztvLatest {
            limit: 50,
            page: 1,
            min_1080p: false,
        };
        assert_eq!(
            latest.output_plan(),
            OutputPlan::new(OutputCategory::Tv, "eztv_latest")
        );

        let top = FetchCommand::EztvTop {
            limit_fetch: 100,
            top_n: 20,
            min_1080p: false,
        };
        assert_eq!(top.source(), Source::Eztv);
        assert_eq!(top.output_plan().prefix, "eztv_top_20_seeded");
    }
}
