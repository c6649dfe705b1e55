use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `TAC_HTTP__TIMEOUT_SECS=30`
const ENV_PREFIX: &str = "TAC_";

/// Global then local config file locations, lowest priority first.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));
    if let Some(dir) = config_home {
        paths.push(dir.join("torrent_api_clients").join("config.toml"));
    }

    paths.push(PathBuf::from("torrent_api_clients.toml"));
    paths
}

/// Load configuration with environment variable overrides.
///
/// An explicit path must exist and replaces the default file locations.
/// Without one, the global and local files are merged when present.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let files = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            vec![path.to_path_buf()]
        }
        None => default_config_paths(),
    };

    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    for file in files {
        // Missing default locations are skipped by the provider.
        figment = figment.merge(Toml::file(file));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
