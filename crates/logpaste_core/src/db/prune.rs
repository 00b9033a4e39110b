//! Active expiration sweep complementing lazy eviction on read.

use super::backend::{read_json, KvBackend, Namespace};
use super::index::RecencyIndex;
use crate::{clock::Clock, error::AppError, models::paste::PasteRecord};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{info, warn};

/// Result of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub removed: usize,
}

/// Deletes expired pastes and drops their recency index entries.
#[derive(Clone)]
pub struct Pruner {
    backend: Arc<dyn KvBackend>,
    clock: Arc<dyn Clock>,
    index: RecencyIndex,
}

impl Pruner {
    pub fn new(backend: Arc<dyn KvBackend>, clock: Arc<dyn Clock>, index: RecencyIndex) -> Self {
        Self {
            backend,
            clock,
            index,
        }
    }

    /// Scan the paste namespace and delete every expired record.
    ///
    /// Unreadable records and failed deletions are logged and skipped. The
    /// recency index is filtered only when at least one record was removed;
    /// a failure there is logged and does not discard the report.
    ///
    /// # Returns
    /// How many records were deleted. A second sweep with no new expirations
    /// reports zero.
    ///
    /// # Errors
    /// Only when the key listing itself fails.
    pub fn sweep(&self) -> Result<SweepReport, AppError> {
        let now = self.clock.now();
        let keys = self.backend.list_keys(Namespace::Pastes)?;
        let mut removed = 0;

        for key in keys {
            let record =
                match read_json::<PasteRecord>(self.backend.as_ref(), Namespace::Pastes, &key) {
                    Ok(Some(record)) => record,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!(key = %key, error = %err, "skipping unreadable paste during sweep");
                        continue;
                    }
                };
            if !record.is_expired(now) {
                continue;
            }
            match self.backend.delete(Namespace::Pastes, &key) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => warn!(key = %key, error = %err, "failed to delete expired paste"),
            }
        }

        if removed > 0 {
            match self.index.retain_unexpired(now) {
                Ok(dropped) => info!(removed, index_dropped = dropped, "pruned expired pastes"),
                Err(err) => warn!(removed, error = %err, "pruned pastes but index repair failed"),
            }
        }

        Ok(SweepReport { removed })
    }

    /// Spawn a background Tokio task that calls [`Self::sweep`] every `interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_sweep(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                if let Err(err) = self.sweep() {
                    warn!(error = %err, "background sweep error");
                }
            }
        })
    }
}
