//! Storage layer for LogPaste.
//!
//! Everything sits on a [`KvBackend`]: a plain key-value store without
//! expiration, indexes, or multi-key transactions. Expiration is enforced
//! lazily on read and actively by [`prune::Pruner`]; listing goes through
//! [`index::RecencyIndex`]. The index and the rate-limit counters are
//! updated with single-key conditional writes, so concurrent updates retry
//! instead of overwriting each other. Writes spanning two keys (a record and
//! its index entry) are not atomic.

/// Key-value backend trait and implementations.
pub mod backend;
/// Bounded recency index.
pub mod index;
/// Paste storage helpers.
pub mod paste;
/// Expired-paste sweep.
pub mod prune;
/// Fixed-window rate limiter.
pub mod rate_limit;
/// redb table definitions.
pub mod tables;

pub use backend::{KvBackend, MemoryBackend, Namespace, RedbBackend};
pub use index::RecencyIndex;
pub use paste::PasteStore;
pub use prune::{Pruner, SweepReport};
pub use rate_limit::{Admission, RateLimiter};

use crate::{
    clock::{Clock, SystemClock},
    config::{Config, RateLimitConfig, StorageDriver},
    constants::META_LIMIT,
    error::AppError,
    naming::{self, IdGenerator},
};
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// Storage handle bundling the paste store, index, limiter, and pruner over
/// one shared backend.
#[derive(Clone)]
pub struct Database {
    pub backend: Arc<dyn KvBackend>,
    pub pastes: PasteStore,
    pub index: RecencyIndex,
    pub limits: RateLimiter,
    pub pruner: Pruner,
    clock: Arc<dyn Clock>,
}

impl Database {
    /// Wire every component over `backend`.
    ///
    /// # Arguments
    /// - `backend`: Shared key-value backend.
    /// - `clock`: Time source for expiration and rate-limit windows.
    /// - `rate_limit`: Window and request ceiling for the write path.
    pub fn new(
        backend: Arc<dyn KvBackend>,
        clock: Arc<dyn Clock>,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self::with_parts(backend, clock, rate_limit, naming::default_generator())
    }

    fn with_parts(
        backend: Arc<dyn KvBackend>,
        clock: Arc<dyn Clock>,
        rate_limit: RateLimitConfig,
        ids: IdGenerator,
    ) -> Self {
        let index = RecencyIndex::new(backend.clone(), META_LIMIT);
        Self {
            pastes: PasteStore::new(backend.clone(), clock.clone(), index.clone(), ids),
            limits: RateLimiter::new(backend.clone(), clock.clone(), rate_limit),
            pruner: Pruner::new(backend.clone(), clock.clone(), index.clone()),
            index,
            backend,
            clock,
        }
    }

    /// Open the backend selected by `config` with the system clock.
    ///
    /// # Errors
    /// Returns an error if the redb store cannot be opened.
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let backend: Arc<dyn KvBackend> = match config.storage {
            StorageDriver::Redb => Arc::new(RedbBackend::open(&config.db_path)?),
            StorageDriver::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(Self::new(backend, Arc::new(SystemClock), config.rate_limit))
    }

    /// Replace the paste id source, keeping every other component.
    pub fn with_id_generator(self, ids: IdGenerator) -> Self {
        let rate_limit = self.limits.config();
        Self::with_parts(self.backend, self.clock, rate_limit, ids)
    }
}
