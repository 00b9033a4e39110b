//! Key-value backend abstraction.
//!
//! Backends expose plain get/set/delete/list-keys plus a single-key
//! conditional write. There is no native expiration and no secondary index;
//! the stores layered on top implement both.

mod memory;
mod redb_kv;

pub use self::memory::MemoryBackend;
pub use self::redb_kv::RedbBackend;

use crate::{constants::CAS_MAX_ATTEMPTS, error::AppError};
use serde::{de::DeserializeOwned, Serialize};

/// Logical keyspace inside a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// `<id>.json` -> paste record.
    Pastes,
    /// `index.json` -> recency index.
    Meta,
    /// `pastes:<identity>` -> rate-limit counter.
    RateLimits,
}

impl Namespace {
    /// Stable name, also used for log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pastes => "pastes",
            Self::Meta => "pastes:meta",
            Self::RateLimits => "ratelimits",
        }
    }
}

/// Opaque associative store the paste layer is built on.
///
/// Every method is a single short call; implementations must not hold state
/// across calls that would make two calls atomic together.
pub trait KvBackend: Send + Sync {
    /// Fetch the raw value stored under `key`.
    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Store `value` under `key`, replacing anything present.
    fn set(&self, namespace: Namespace, key: &str, value: &[u8]) -> Result<(), AppError>;

    /// Remove `key`. Returns whether a value was present.
    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, AppError>;

    /// Every key currently stored in `namespace`.
    fn list_keys(&self, namespace: Namespace) -> Result<Vec<String>, AppError>;

    /// Write `new` only when the current value equals `expected`
    /// (`None` meaning the key must be absent).
    ///
    /// # Returns
    /// `Ok(true)` when the write happened, `Ok(false)` on a mismatch.
    fn compare_and_swap(
        &self,
        namespace: Namespace,
        key: &str,
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, AppError>;
}

/// Load and decode a JSON value.
///
/// # Errors
/// Backend failures, or [`AppError::Serialization`] when the stored bytes are malformed.
pub(crate) fn read_json<T: DeserializeOwned>(
    backend: &dyn KvBackend,
    namespace: Namespace,
    key: &str,
) -> Result<Option<T>, AppError> {
    backend
        .get(namespace, key)?
        .map(|bytes| serde_json::from_slice(&bytes))
        .transpose()
        .map_err(AppError::from)
}

/// Conditional read-modify-write of a JSON value.
///
/// `step` receives the decoded current value and returns the value to store
/// (`None` to leave storage untouched) together with the caller's outcome.
/// The write only lands when nobody changed the key since it was read;
/// otherwise `step` runs again on the fresh value.
///
/// # Errors
/// Backend or decode failures, or [`AppError::StorageMessage`] when the key
/// kept changing for [`CAS_MAX_ATTEMPTS`] rounds.
pub(crate) fn update_json<T, R, F>(
    backend: &dyn KvBackend,
    namespace: Namespace,
    key: &str,
    mut step: F,
) -> Result<R, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(Option<T>) -> (Option<T>, R),
{
    for attempt in 1..=CAS_MAX_ATTEMPTS {
        let raw = backend.get(namespace, key)?;
        let current = raw
            .as_deref()
            .map(serde_json::from_slice::<T>)
            .transpose()?;
        let (next, outcome) = step(current);
        let Some(next) = next else {
            return Ok(outcome);
        };
        let encoded = serde_json::to_vec(&next)?;
        if backend.compare_and_swap(namespace, key, raw.as_deref(), &encoded)? {
            return Ok(outcome);
        }
        tracing::debug!(
            namespace = namespace.as_str(),
            key,
            attempt,
            "conditional write lost a race; retrying"
        );
    }
    Err(AppError::StorageMessage(format!(
        "Concurrent updates to '{}' did not settle after {} attempts",
        key, CAS_MAX_ATTEMPTS
    )))
}
