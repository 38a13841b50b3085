use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pipeline::DEFAULT_BATCH_SIZE;

const DEFAULT_CONFIG_FILE: &str = "vector_client.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Streaming vector telemetry client", version)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[clap(long, env = "VECSTREAM_HOST", help = "Host of the vector source.")]
    pub host: Option<String>,

    #[clap(long, env = "VECSTREAM_PORT", help = "Port of the vector source.")]
    pub port: Option<u16>,

    #[clap(long, env = "VECSTREAM_OUTPUT_PATH", help = "Output CSV file. Defaults to out_<unix-time>.csv in the output directory.")]
    pub output_path: Option<PathBuf>,

    #[clap(long, env = "VECSTREAM_OUTPUT_DIR", help = "Directory for the generated output file name.")]
    pub output_dir: Option<PathBuf>,

    #[clap(long, env = "VECSTREAM_BATCH_SIZE", help = "Vectors per summary row.")]
    pub batch_size: Option<usize>,

    #[clap(long, env = "VECSTREAM_EXPECTED_WIDTH", help = "Expected vector width, used only to pre-allocate.")]
    pub expected_width: Option<usize>,

    #[clap(long, env = "VECSTREAM_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "VECSTREAM_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "VECSTREAM_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,
}

/// Fully resolved client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub host: String,
    pub port: u16,
    pub output_path: PathBuf,
    pub batch_size: usize,
    pub expected_width: usize,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl ClientConfig {
    /// Built-in defaults.
    pub fn defaults() -> Self {
        ClientConfig {
            host: Some("127.0.0.1".to_string()),
            port: Some(8888),
            output_dir: Some(PathBuf::from(".")),
            batch_size: Some(DEFAULT_BATCH_SIZE),
            expected_width: Some(50),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    // Merge two configs, where 'other' overrides 'self' for Some values
    pub fn merge(self, other: ClientConfig) -> ClientConfig {
        ClientConfig {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            output_path: other.output_path.or(self.output_path),
            output_dir: other.output_dir.or(self.output_dir),
            batch_size: other.batch_size.or(self.batch_size),
            expected_width: other.expected_width.or(self.expected_width),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Reads a JSON config file. A missing file yields `Ok(None)`.
    pub fn from_file(path: &Path) -> Result<Option<ClientConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }

    /// Turns the merged config into concrete settings.
    pub fn resolve(self) -> Result<ClientSettings, ConfigError> {
        let defaults = ClientConfig::defaults();
        let merged = defaults.merge(self);

        let port = merged.port.unwrap_or(8888);
        if port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        let batch_size = merged.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(ConfigError::Invalid("batch size must be at least 1".to_string()));
        }

        let output_path = merged.output_path.unwrap_or_else(|| {
            let dir = merged.output_dir.unwrap_or_else(|| PathBuf::from("."));
            dir.join(default_output_name(chrono::Utc::now().timestamp()))
        });

        Ok(ClientSettings {
            host: merged.host.unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            output_path,
            batch_size,
            expected_width: merged.expected_width.unwrap_or(0),
            log_dir: merged.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
            log_level: merged.log_level.unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// `out_<unix-seconds>.csv`
pub fn default_output_name(unix_seconds: i64) -> String {
    format!("out_{}.csv", unix_seconds)
}

/// Merges `cli` (which already carries env values) over the config file it
/// points at, over the built-in defaults.
pub fn load_config_from(cli: ClientConfig) -> Result<ClientSettings, ConfigError> {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = ClientConfig::defaults();
    match ClientConfig::from_file(&config_file_path)? {
        Some(file_config) => {
            tracing::info!("Loaded config file {}", config_file_path.display());
            current_config = current_config.merge(file_config);
        }
        None => {
            tracing::info!(
                "Config file not found at {}. Using defaults and environment/CLI variables.",
                config_file_path.display()
            );
        }
    }

    current_config.merge(cli).resolve()
}

/// Parses the process arguments and environment, then applies the file and
/// default layers.
pub fn load_config() -> Result<ClientSettings, ConfigError> {
    load_config_from(ClientConfig::parse())
}
