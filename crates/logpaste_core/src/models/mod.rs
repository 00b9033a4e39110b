//! Data models for persistence and API payloads.

/// Paste records, summaries, and request payloads.
pub mod paste;
/// Per-client rate-limit counters.
pub mod rate_limit;
