use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub tpb: TpbConfig,
    #[serde(default)]
    pub eztv: EztvConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Where CSV files are written
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Outputs")
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Retries on 429/5xx responses (default: 3)
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Base delay between retries, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("torrent-api-clients/{}", env!("CARGO_PKG_VERSION"))
}

fn default_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// TPB index API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TpbConfig {
    #[serde(default = "default_tpb_base_url")]
    pub base_url: String,
}

impl Default for TpbConfig {
    fn default() -> Self {
        Self {
            base_url: default_tpb_base_url(),
        }
    }
}

fn default_tpb_base_url() -> String {
    "https://apibay.org/q.php".to_string()
}

/// EZTV tracker API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EztvConfig {
    #[serde(default = "default_eztv_base_url")]
    pub base_url: String,
    /// Largest `limit` the API accepts per request (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Upper bound on consecutive page requests per command (default: 5)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for EztvConfig {
    fn default() -> Self {
        Self {
            base_url: default_eztv_base_url(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_eztv_base_url() -> String {
    "https://eztvx.to/api/get-torrents".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    5
}

/// Result filtering defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Keep only 1080p and better, even without the CLI flag
    #[serde(default)]
    pub min_1080p: bool,
}
