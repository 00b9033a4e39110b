//! Shared constants used across LogPaste crates.

/// Default API port for LogPaste.
pub const DEFAULT_PORT: u16 = 38412;

/// Default maximum paste content size in bytes (256 KiB).
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 256 * 1024;

/// Maximum title length in characters, after trimming.
pub const TITLE_MAX: usize = 120;
/// Maximum source label length in characters, after trimming.
pub const SOURCE_MAX: usize = 120;
/// Title stored when the request omits one or sends only whitespace.
pub const DEFAULT_TITLE: &str = "Untitled Paste";

/// Expiration presets accepted by the API: 10m, 1h, 6h, 1d, 7d.
pub const ALLOWED_EXPIRATIONS_MINUTES: [u32; 5] = [10, 60, 360, 1440, 10080];

/// Maximum number of summaries kept in the recency index.
pub const META_LIMIT: usize = 25;
/// Number of characters of content frozen into a summary preview.
pub const PREVIEW_CHARS: usize = 160;
/// Default page size for recent listings.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Length of generated paste ids.
pub const ID_LENGTH: usize = 8;
/// Attempts to find an unused id before giving up.
pub const ID_MAX_ATTEMPTS: usize = 5;
/// Attempts for a conditional read-modify-write before reporting contention.
pub const CAS_MAX_ATTEMPTS: usize = 16;

/// Default fixed rate-limit window in milliseconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
/// Default number of writes admitted per window and client.
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 120;

/// Default interval between background prune sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Key of the recency index inside the meta namespace.
pub const META_INDEX_KEY: &str = "index.json";
/// Prefix of rate-limit keys inside the rate-limit namespace.
pub const RATE_LIMIT_KEY_PREFIX: &str = "pastes:";
/// Suffix appended to paste ids to form their storage key.
pub const PASTE_KEY_SUFFIX: &str = ".json";
