use serde::Deserialize;
use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_INDEXING_TIMEOUT_SECS: u64 = 120;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_PORT_RANGE: RangeInclusive<u16> = 8000..=8099;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docchat server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// API key sent to the Gemini API on every request.
    pub google_api_key: String,
    /// Base URL of the Gemini API (overridable for testing and proxies).
    pub gemini_api_base_url: String,
    /// Model used to answer questions.
    pub gemini_model: String,
    /// Directory receiving the local copy of each uploaded document.
    pub upload_dir: PathBuf,
    /// Directory holding `index.html` and the browser assets.
    pub static_dir: PathBuf,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Ports tried in order when no explicit port is configured.
    pub server_port_range: RangeInclusive<u16>,
    /// Log file path; `logs/docchat.log` when unset.
    pub log_file: Option<PathBuf>,
    /// Deadline for a single Gemini request, in seconds.
    pub gemini_request_timeout_secs: u64,
    /// Ceiling on the wait for remote indexing, in seconds.
    pub indexing_timeout_secs: u64,
    /// Delay between two indexing status polls, in seconds.
    pub indexing_poll_interval_secs: u64,
    /// Largest request body accepted by the HTTP surface.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let indexing_poll_interval_secs = parse_optional(
            "INDEXING_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        if indexing_poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "INDEXING_POLL_INTERVAL_SECS".into(),
            ));
        }
        let max_upload_bytes = parse_optional("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue("MAX_UPLOAD_BYTES".into()));
        }

        Ok(Self {
            google_api_key: load_env("GOOGLE_API_KEY")?,
            gemini_api_base_url: load_env_optional("GEMINI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            gemini_model: load_env_optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            upload_dir: load_env_optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            static_dir: load_env_optional("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            server_port_range: load_env_optional("SERVER_PORT_RANGE")
                .map(|value| {
                    parse_port_range(&value)
                        .ok_or_else(|| ConfigError::InvalidValue("SERVER_PORT_RANGE".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_PORT_RANGE),
            log_file: load_env_optional("DOCCHAT_LOG_FILE").map(PathBuf::from),
            gemini_request_timeout_secs: parse_optional(
                "GEMINI_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            indexing_timeout_secs: parse_optional(
                "INDEXING_TIMEOUT_SECS",
                DEFAULT_INDEXING_TIMEOUT_SECS,
            )?,
            indexing_poll_interval_secs,
            max_upload_bytes,
        })
    }

    /// Ceiling on the indexing wait as a [`Duration`].
    pub fn indexing_timeout(&self) -> Duration {
        Duration::from_secs(self.indexing_timeout_secs)
    }

    /// Deadline for a single Gemini request as a [`Duration`].
    pub fn gemini_request_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini_request_timeout_secs)
    }

    /// Interval between indexing status polls as a [`Duration`].
    pub fn indexing_poll_interval(&self) -> Duration {
        Duration::from_secs(self.indexing_poll_interval_secs)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse `start-end` (inclusive) or a single port.
fn parse_port_range(value: &str) -> Option<RangeInclusive<u16>> {
    let (start, end) = match value.split_once('-') {
        Some((start, end)) => (start.trim().parse().ok()?, end.trim().parse().ok()?),
        None => {
            let port = value.trim().parse().ok()?;
            (port, port)
        }
    };
    (start <= end).then_some(start..=end)
}

fn parse_optional<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
        .map(|value| value.unwrap_or(default))
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        api_base_url = %config.gemini_api_base_url,
        model = %config.gemini_model,
        upload_dir = %config.upload_dir.display(),
        server_port = ?config.server_port,
        indexing_timeout_secs = config.indexing_timeout_secs,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
