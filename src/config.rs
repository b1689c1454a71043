//! Service configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Configuration for the game service.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    host: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    port: u16,

    /// Directory holding the lookup table JSON files.
    #[serde(default = "default_book_dir")]
    book_dir: PathBuf,

    /// Delay before a scheduled AI move fires, in milliseconds.
    #[serde(default = "default_ai_delay_ms")]
    ai_delay_ms: u64,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

#[instrument]
fn default_book_dir() -> PathBuf {
    PathBuf::from("books")
}

#[instrument]
fn default_ai_delay_ms() -> u64 {
    150
}

impl ServiceConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies command-line overrides on top of the file values.
    #[instrument(skip(self))]
    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
        book_dir: Option<PathBuf>,
        ai_delay_ms: Option<u64>,
    ) {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(book_dir) = book_dir {
            self.book_dir = book_dir;
        }
        if let Some(ai_delay_ms) = ai_delay_ms {
            self.ai_delay_ms = ai_delay_ms;
        }
    }

    /// Returns the address to bind, `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the AI delay as a duration.
    pub fn ai_delay(&self) -> Duration {
        Duration::from_millis(self.ai_delay_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            book_dir: default_book_dir(),
            ai_delay_ms: default_ai_delay_ms(),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
