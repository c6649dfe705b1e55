pub mod config;
pub mod export;
pub mod extract;
pub mod magnet;
pub mod pipeline;
pub mod ranker;
pub mod record;
pub mod source;
pub mod testing;

pub use config::{
    default_config_paths, load_config, load_config_from_str, validate_config, Config, ConfigError,
};
pub use export::{write_records, ExportError, OutputCategory, OutputPlan, WriteMode};
pub use pipeline::{
    collect, export_run, fetch_and_export, ExportSummary, ExportTarget, FetchCommand, RunError,
    RunOutput, Sources,
};
pub use record::{ExtractError, NormalizedRecord, RawResult, Resolution, Source};
pub use source::{
    parse_imdb_id, EztvClient, HttpTransport, JsonTransport, SourceError, TpbCategory, TpbClient,
};
