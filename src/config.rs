//! Application-level configuration loading: room limits, notification sizing, and the
//! question bank location.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ROOMS_CONFIG_PATH";
/// Default location of the question bank JSON file.
const DEFAULT_QUESTION_BANK_PATH: &str = "config/questions.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Maximum number of players in a room.
    pub room_capacity: usize,
    /// Number of characters of a room code.
    pub room_code_length: usize,
    /// How many random codes are tried before room creation gives up.
    pub room_code_attempts: usize,
    /// Buffered snapshots per room before slow subscribers start lagging.
    pub notification_capacity: usize,
    /// Upper bound for a single room transaction, in milliseconds.
    pub transaction_timeout_ms: u64,
    /// Interval between SSE keep-alive comments, in seconds.
    pub keep_alive_secs: u64,
    /// Path of the question bank JSON file.
    pub question_bank_path: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    let config = config.sanitized();
                    info!(
                        path = %path.display(),
                        room_capacity = config.room_capacity,
                        room_code_length = config.room_code_length,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Transaction timeout as a [`Duration`].
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }

    /// Keep-alive interval as a [`Duration`].
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Replace zero values that would make the service unusable with their defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.room_capacity == 0 {
            warn!("room_capacity must be positive; using default");
            self.room_capacity = defaults.room_capacity;
        }
        if self.room_code_length == 0 {
            warn!("room_code_length must be positive; using default");
            self.room_code_length = defaults.room_code_length;
        }
        if self.room_code_attempts == 0 {
            self.room_code_attempts = defaults.room_code_attempts;
        }
        if self.notification_capacity == 0 {
            self.notification_capacity = defaults.notification_capacity;
        }
        if self.keep_alive_secs == 0 {
            self.keep_alive_secs = defaults.keep_alive_secs;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room_capacity: 8,
            room_code_length: 4,
            room_code_attempts: 64,
            notification_capacity: 32,
            transaction_timeout_ms: 5_000,
            keep_alive_secs: 15,
            question_bank_path: PathBuf::from(DEFAULT_QUESTION_BANK_PATH),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
