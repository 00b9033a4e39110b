//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_MAX_CONTENT_BYTES, DEFAULT_PORT, DEFAULT_RATE_LIMIT_MAX, DEFAULT_RATE_LIMIT_WINDOW_MS,
    DEFAULT_SWEEP_INTERVAL_SECS,
};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which key-value backend the process should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// Persistent redb file under `db_path`.
    Redb,
    /// Process-local map; contents are lost on exit.
    Memory,
}

impl FromStr for StorageDriver {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redb" | "fs" => Ok(Self::Redb),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown storage driver '{}'", other)),
        }
    }
}

/// Fixed-window rate limit settings for the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_RATE_LIMIT_WINDOW_MS,
            max_requests: DEFAULT_RATE_LIMIT_MAX,
        }
    }
}

/// Runtime configuration for LogPaste.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_path: String,
    pub storage: StorageDriver,
    pub port: u16,
    pub max_content_bytes: usize,
    pub rate_limit: RateLimitConfig,
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            storage: StorageDriver::Redb,
            port: DEFAULT_PORT,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            rate_limit: RateLimitConfig::default(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_db_path() -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache")
        .join("logpaste")
        .join("db")
        .to_string_lossy()
        .to_string()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}='{}'; using default", name, raw);
            None
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or cannot be parsed.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("DB_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(expand_tilde)
                .unwrap_or(defaults.db_path),
            storage: env_parsed("STORAGE_DRIVER").unwrap_or(defaults.storage),
            port: env_parsed("PORT").unwrap_or(defaults.port),
            max_content_bytes: env_parsed("MAX_CONTENT_BYTES")
                .filter(|bytes: &usize| *bytes > 0)
                .unwrap_or(defaults.max_content_bytes),
            rate_limit: RateLimitConfig {
                window_ms: env_parsed("RATE_LIMIT_WINDOW_MS")
                    .filter(|ms: &u64| *ms > 0)
                    .unwrap_or(defaults.rate_limit.window_ms),
                max_requests: env_parsed("RATE_LIMIT_MAX")
                    .unwrap_or(defaults.rate_limit.max_requests),
            },
            sweep_interval_secs: env_parsed("SWEEP_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(defaults.sweep_interval_secs),
        }
    }

    /// Interval between background prune sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
