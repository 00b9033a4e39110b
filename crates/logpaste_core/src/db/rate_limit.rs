//! Fixed-window request counter per client identity.
//!
//! Windows are independent per identity and are not smoothed: a client can
//! burst up to twice the limit across a window boundary. Counters are never
//! deleted; stale ones are simply rolled over on the next request.

use super::backend::{update_json, KvBackend, Namespace};
use crate::{
    clock::Clock, config::RateLimitConfig, constants::RATE_LIMIT_KEY_PREFIX, error::AppError,
    models::rate_limit::RateLimitRecord,
};
use chrono::Duration;
use std::sync::Arc;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected { retry_after_secs: u64 },
}

impl Admission {
    /// Convert a rejection into [`AppError::RateLimited`].
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Rejected { retry_after_secs } => Err(AppError::RateLimited { retry_after_secs }),
        }
    }
}

/// Write-path limiter backed by the rate-limit namespace.
#[derive(Clone)]
pub struct RateLimiter {
    backend: Arc<dyn KvBackend>,
    clock: Arc<dyn Clock>,
    config: RateLimitConfig,
}

fn rate_limit_key(identity: &str) -> String {
    format!("{}{}", RATE_LIMIT_KEY_PREFIX, identity)
}

impl RateLimiter {
    pub fn new(backend: Arc<dyn KvBackend>, clock: Arc<dyn Clock>, config: RateLimitConfig) -> Self {
        Self {
            backend,
            clock,
            config,
        }
    }

    /// Active settings.
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Count one request for `identity` if its window still has room.
    ///
    /// A rejected request is not counted and writes nothing.
    ///
    /// # Returns
    /// [`Admission::Allowed`], or [`Admission::Rejected`] with the seconds
    /// left until the window resets (at least 1).
    ///
    /// # Errors
    /// Storage failures, a malformed counter, or persistent write contention.
    pub fn admit(&self, identity: &str) -> Result<Admission, AppError> {
        let now = self.clock.now();
        let window = i64::try_from(self.config.window_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX);
        let max_requests = self.config.max_requests;

        update_json(
            self.backend.as_ref(),
            Namespace::RateLimits,
            &rate_limit_key(identity),
            |current: Option<RateLimitRecord>| {
                let mut record = current.unwrap_or_else(|| RateLimitRecord::fresh(now, window));
                if now >= record.reset_at {
                    record = RateLimitRecord::fresh(now, window);
                }

                if record.count >= max_requests {
                    let remaining_ms = (record.reset_at - now).num_milliseconds().max(0);
                    let retry_after_secs = (remaining_ms as u64).div_ceil(1000).max(1);
                    return (None, Admission::Rejected { retry_after_secs });
                }

                record.count += 1;
                (Some(record), Admission::Allowed)
            },
        )
    }
}
