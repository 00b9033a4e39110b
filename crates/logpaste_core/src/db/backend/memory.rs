//! In-process key-value store.

use super::{KvBackend, Namespace};
use crate::error::AppError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

type Entries = HashMap<Namespace, BTreeMap<String, Vec<u8>>>;

/// Key-value backend held in memory behind a mutex.
///
/// Used by tests and by the `memory` storage driver. Contents are lost when
/// the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<Entries>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::StorageMessage("Memory backend lock poisoned".to_string()))
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self
            .lock()?
            .get(&namespace)
            .and_then(|table| table.get(key))
            .cloned())
    }

    fn set(&self, namespace: Namespace, key: &str, value: &[u8]) -> Result<(), AppError> {
        self.lock()?
            .entry(namespace)
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, AppError> {
        Ok(self
            .lock()?
            .get_mut(&namespace)
            .and_then(|table| table.remove(key))
            .is_some())
    }

    fn list_keys(&self, namespace: Namespace) -> Result<Vec<String>, AppError> {
        Ok(self
            .lock()?
            .get(&namespace)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn compare_and_swap(
        &self,
        namespace: Namespace,
        key: &str,
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, AppError> {
        let mut entries = self.lock()?;
        let table = entries.entry(namespace).or_default();
        if table.get(key).map(Vec::as_slice) != expected {
            return Ok(false);
        }
        table.insert(key.to_string(), new.to_vec());
        Ok(true)
    }
}
