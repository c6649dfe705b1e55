use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use torrent_api_core::{FetchCommand, TpbCategory};

#[derive(Parser, Debug)]
#[command(name = "torrent-api-clients")]
#[command(about = "Query public torrent metadata APIs and export ranked CSVs")]
#[command(version)]
pub struct Cli {
    /// Configuration file; replaces the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output directory (overrides `output.dir`)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Append to an existing CSV instead of writing a timestamped file
    #[arg(long, global = true)]
    pub append: bool,

    /// Leave the timestamp out of the file name
    #[arg(long, global = true)]
    pub no_timestamp: bool,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub provider: Provider,
}

#[derive(Subcommand, Debug)]
pub enum Provider {
    /// The Pirate Bay index (apibay)
    Tpb {
        #[command(subcommand)]
        command: TpbCommand,
    },
    /// EZTV tracker
    Eztv {
        #[command(subcommand)]
        command: EztvCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum TpbCommand {
    /// Search by keywords, ranked by seeders
    Search {
        #[arg(short, long)]
        query: String,

        #[arg(long, value_enum, default_value_t = CategoryArg::Movies)]
        category: CategoryArg,

        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum EztvCommand {
    /// Latest uploads, newest first
    Latest {
        #[arg(long, default_value_t = 50)]
        limit: usize,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Keep only 1080p and above
        #[arg(long = "min-1080p")]
        min_1080p: bool,
    },
    /// Every torrent of one show
    Show {
        /// IMDb id, with or without the `tt` prefix
        #[arg(long)]
        imdb_id: String,

        /// Name used in the output file name
        #[arg(long, default_value = "Show")]
        show_name: String,

        #[arg(long)]
        season: Option<u32>,

        /// Keep only 1080p and above
        #[arg(long = "min-1080p")]
        min_1080p: bool,
    },
    /// Best-seeded of the latest uploads
    Top {
        /// How many latest uploads to consider
        #[arg(long, default_value_t = 100)]
        limit_fetch: usize,

        #[arg(long, default_value_t = 20)]
        top_n: usize,

        /// Keep only 1080p and above
        #[arg(long = "min-1080p")]
        min_1080p: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryArg {
    Movies,
    Tv,
}

impl From<CategoryArg> for TpbCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Movies => TpbCategory::Movies,
            CategoryArg::Tv => TpbCategory::Tv,
        }
    }
}

impl Provider {
    /// The core command; `min_1080p` is the configured default and is ORed
    /// with the flag.
    pub fn into_fetch_command(self, min_1080p: bool) -> FetchCommand {
        match self {
            Provider::Tpb {
                command:
                    TpbCommand::Search {
                        query,
                        category,
                        limit,
                    },
            } => FetchCommand::TpbSearch {
                query,
                category: category.into(),
                limit,
            },
            Provider::Eztv { command } => match command {
                EztvCommand::Latest {
                    limit,
                    page,
                    min_1080p: flag,
                } => FetchCommand::EztvLatest {
                    limit,
                    page,
                    min_1080p: flag || min_1080p,
                },
                EztvCommand::Show {
                    imdb_id,
                    show_name,
                    season,
                    min_1080p: flag,
                } => FetchCommand::EztvShow {
                    imdb_id,
                    show_name,
                    season,
                    min_1080p: flag || min_1080p,
                },
                EztvCommand::Top {
                    limit_fetch,
                    top_n,
                    min_1080p: flag,
                } => FetchCommand::EztvTop {
                    limit_fetch,
                    top_n,
                    min_1080p: flag || min_1080p,
                },
            },
        }
    }
}
