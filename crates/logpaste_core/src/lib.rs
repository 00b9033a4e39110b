//! Core domain library for LogPaste (config, storage, lifecycle, rate limiting).

/// Time source abstraction used by expiration and rate limiting.
pub mod clock;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across LogPaste crates.
pub mod constants;
/// Key-value storage layer: backends, paste store, recency index, limiter, pruning.
pub mod db;
/// Process-global environment mutation helpers.
pub mod env;
/// Application error types (storage/domain).
pub mod error;
/// Data models for persistence and API payloads.
pub mod models;
/// Paste identifier generation.
pub mod naming;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use constants::DEFAULT_PORT;
pub use db::{Admission, Database, KvBackend, MemoryBackend, RedbBackend, SweepReport};
pub use error::AppError;
