//! Rate-limit counter persisted per client identity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-window counter stored under `pastes:<identity>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    pub count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub reset_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Empty window opening at `now`.
    pub fn fresh(now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}
