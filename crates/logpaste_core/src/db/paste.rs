//! Paste storage operations over a [`KvBackend`].

use super::backend::{read_json, KvBackend, Namespace};
use super::index::RecencyIndex;
use crate::{
    clock::Clock,
    constants::{ID_MAX_ATTEMPTS, PASTE_KEY_SUFFIX},
    error::AppError,
    models::paste::*,
    naming::IdGenerator,
};
use std::sync::Arc;

/// Storage key for a paste id.
pub fn paste_key(id: &str) -> String {
    format!("{}{}", id, PASTE_KEY_SUFFIX)
}

/// Accessor for paste records and their recency index entries.
#[derive(Clone)]
pub struct PasteStore {
    backend: Arc<dyn KvBackend>,
    clock: Arc<dyn Clock>,
    index: RecencyIndex,
    ids: IdGenerator,
}

impl PasteStore {
    /// Build a store over `backend`.
    ///
    /// # Arguments
    /// - `backend`: Key-value backend holding the paste namespace.
    /// - `clock`: Time source for creation stamps and expiration checks.
    /// - `index`: Recency index maintained alongside records.
    /// - `ids`: Id source; retried on collision.
    pub fn new(
        backend: Arc<dyn KvBackend>,
        clock: Arc<dyn Clock>,
        index: RecencyIndex,
        ids: IdGenerator,
    ) -> Self {
        Self {
            backend,
            clock,
            index,
            ids,
        }
    }

    /// Persist a new paste and put it at the front of the recency index.
    ///
    /// The record is claimed with a conditional write against an absent key,
    /// so a colliding id is detected atomically and a fresh id is drawn.
    ///
    /// # Arguments
    /// - `input`: Validated paste input.
    /// - `client`: Origin metadata captured by the request layer.
    ///
    /// # Returns
    /// The stored record.
    ///
    /// # Errors
    /// [`AppError::IdSpaceExhausted`] when every drawn id was taken, or a
    /// storage error. If only the index update fails, the error is returned
    /// but the record stays stored and retrievable by id.
    pub fn create(&self, input: NewPaste, client: ClientMeta) -> Result<PasteRecord, AppError> {
        let now = self.clock.now();
        let mut record = PasteRecord::new(String::new(), input, client, now);

        for attempt in 1..=ID_MAX_ATTEMPTS {
            let candidate = (self.ids)();
            if candidate.is_empty() {
                continue;
            }
            record.id = candidate;
            let encoded = serde_json::to_vec(&record)?;
            let claimed = self.backend.compare_and_swap(
                Namespace::Pastes,
                &paste_key(&record.id),
                None,
                &encoded,
            )?;
            if !claimed {
                tracing::debug!(attempt, id = %record.id, "paste id collision; drawing another");
                continue;
            }

            if let Err(err) = self.index.record(PasteSummary::from(&record)) {
                tracing::warn!(
                    id = %record.id,
                    error = %err,
                    "paste stored but recency index update failed"
                );
                return Err(err);
            }
            tracing::debug!(id = %record.id, expires_at = ?record.expires_at, "created paste");
            return Ok(record);
        }

        Err(AppError::IdSpaceExhausted {
            attempts: ID_MAX_ATTEMPTS,
        })
    }

    /// Fetch a paste by id, evicting it when expired.
    ///
    /// # Returns
    /// `Ok(Some(paste))` when logically present, `Ok(None)` when missing or expired.
    ///
    /// # Errors
    /// Storage access, decode, or eviction failures.
    pub fn get(&self, id: &str) -> Result<Option<PasteRecord>, AppError> {
        let Some(record) =
            read_json::<PasteRecord>(self.backend.as_ref(), Namespace::Pastes, &paste_key(id))?
        else {
            return Ok(None);
        };
        if record.is_expired(self.clock.now()) {
            self.remove(id)?;
            tracing::debug!(id, "lazy-evicted expired paste");
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Fetch a paste by id, treating absence as an error.
    ///
    /// # Errors
    /// [`AppError::BadRequest`] for a blank id, [`AppError::NotFound`] when
    /// absent or expired, or any error from [`Self::get`].
    pub fn get_or_fail(&self, id: Option<&str>) -> Result<PasteRecord, AppError> {
        let id = id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing paste id".to_string()))?;
        self.get(id)?.ok_or(AppError::NotFound)
    }

    /// Delete a paste and its recency index entry.
    ///
    /// # Returns
    /// Whether a stored record was removed.
    ///
    /// # Errors
    /// Storage failures on either the record or the index.
    pub fn remove(&self, id: &str) -> Result<bool, AppError> {
        let removed = self.backend.delete(Namespace::Pastes, &paste_key(id))?;
        self.index.forget(id)?;
        Ok(removed)
    }

    /// Most recent summaries, newest first.
    ///
    /// Entries are not checked for expiration here; the prune sweep repairs
    /// the index.
    ///
    /// # Errors
    /// Storage or decode failures reading the index.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<PasteSummary>, AppError> {
        let mut entries = self.index.load()?;
        entries.truncate(limit);
        Ok(entries)
    }
}
