//! Bounded, newest-first index of paste summaries.
//!
//! The index is one JSON array stored under [`META_INDEX_KEY`]. It is kept in
//! step with paste creation and removal, but the record write and the index
//! write are separate calls: an index entry can outlive its paste until the
//! next read or sweep, and a create interrupted between the two leaves a
//! paste that is retrievable by id but absent from listings.

use super::backend::{read_json, update_json, KvBackend, Namespace};
use crate::{constants::META_INDEX_KEY, error::AppError, models::paste::PasteSummary};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Accessor for the recency index.
#[derive(Clone)]
pub struct RecencyIndex {
    backend: Arc<dyn KvBackend>,
    cap: usize,
}

impl RecencyIndex {
    /// Bind the index to `backend`, keeping at most `cap` entries.
    pub fn new(backend: Arc<dyn KvBackend>, cap: usize) -> Self {
        Self { backend, cap }
    }

    /// Maximum number of entries retained.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Current entries, newest first. Missing index reads as empty.
    ///
    /// # Errors
    /// Backend failures or a malformed stored index.
    pub fn load(&self) -> Result<Vec<PasteSummary>, AppError> {
        Ok(
            read_json::<Vec<PasteSummary>>(self.backend.as_ref(), Namespace::Meta, META_INDEX_KEY)?
                .unwrap_or_default(),
        )
    }

    /// Put `summary` at the front, replacing any entry with the same id and
    /// truncating to the cap.
    ///
    /// # Errors
    /// Backend failures, a malformed index, or persistent write contention.
    pub fn record(&self, summary: PasteSummary) -> Result<(), AppError> {
        let cap = self.cap;
        update_json(
            self.backend.as_ref(),
            Namespace::Meta,
            META_INDEX_KEY,
            |current: Option<Vec<PasteSummary>>| {
                let mut entries = current.unwrap_or_default();
                entries.retain(|entry| entry.id != summary.id);
                entries.insert(0, summary.clone());
                entries.truncate(cap);
                (Some(entries), ())
            },
        )
    }

    /// Drop the entry for `id`, if any.
    ///
    /// # Returns
    /// Whether an entry was removed. Nothing is written when it was absent.
    ///
    /// # Errors
    /// Backend failures, a malformed index, or persistent write contention.
    pub fn forget(&self, id: &str) -> Result<bool, AppError> {
        update_json(
            self.backend.as_ref(),
            Namespace::Meta,
            META_INDEX_KEY,
            |current: Option<Vec<PasteSummary>>| {
                let mut entries = current.unwrap_or_default();
                let before = entries.len();
                entries.retain(|entry| entry.id != id);
                if entries.len() == before {
                    (None, false)
                } else {
                    (Some(entries), true)
                }
            },
        )
    }

    /// Drop every entry whose expiration has passed at `now`.
    ///
    /// # Returns
    /// Number of entries removed. Nothing is written when none expired.
    ///
    /// # Errors
    /// Backend failures, a malformed index, or persistent write contention.
    pub fn retain_unexpired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        update_json(
            self.backend.as_ref(),
            Namespace::Meta,
            META_INDEX_KEY,
            |current: Option<Vec<PasteSummary>>| {
                let mut entries = current.unwrap_or_default();
                let before = entries.len();
                entries.retain(|entry| !entry.is_expired(now));
                let dropped = before - entries.len();
                if dropped == 0 {
                    (None, 0)
                } else {
                    (Some(entries), dropped)
                }
            },
        )
    }
}
