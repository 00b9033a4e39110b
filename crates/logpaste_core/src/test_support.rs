//! Shared test-only helpers for logpaste_core.

use crate::clock::ManualClock;
use crate::config::RateLimitConfig;
use crate::db::{Database, KvBackend, MemoryBackend, Namespace, RedbBackend};
use crate::error::AppError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Fixed starting instant for deterministic clocks (2024-01-01T00:00:00Z).
pub(crate) const T0_MILLIS: i64 = 1_704_067_200_000;

/// In-memory database driven by a manual clock starting at [`T0_MILLIS`].
pub(crate) fn setup_memory_db() -> (Database, Arc<ManualClock>) {
    setup_memory_db_with_limits(RateLimitConfig::default())
}

/// In-memory database with explicit rate-limit settings.
pub(crate) fn setup_memory_db_with_limits(limits: RateLimitConfig) -> (Database, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_millis(T0_MILLIS));
    let db = Database::new(Arc::new(MemoryBackend::new()), clock.clone(), limits);
    (db, clock)
}

/// Creates an isolated temporary redb database and returns it with the temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if temp-dir creation, path conversion, or database initialization
/// fails in the test environment.
pub(crate) fn setup_temp_db() -> (Database, Arc<ManualClock>, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("db");
    let backend = RedbBackend::open(db_path.to_str().expect("db path")).expect("open redb");
    let clock = Arc::new(ManualClock::at_millis(T0_MILLIS));
    let db = Database::new(Arc::new(backend), clock.clone(), RateLimitConfig::default());
    (db, clock, temp_dir)
}

/// Backend operation that [`FlakyBackend`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    Get,
    Delete,
    CompareAndSwap,
}

/// Memory backend that fails selected operations on selected namespaces.
#[derive(Default)]
pub(crate) struct FlakyBackend {
    inner: MemoryBackend,
    failing: Mutex<HashSet<(Op, Namespace)>>,
    failing_keys: Mutex<HashSet<String>>,
}

impl FlakyBackend {
    pub(crate) fn fail(&self, op: Op, namespace: Namespace) {
        self.failing.lock().expect("flaky lock").insert((op, namespace));
    }

    pub(crate) fn heal(&self) {
        self.failing.lock().expect("flaky lock").clear();
        self.failing_keys.lock().expect("flaky lock").clear();
    }

    /// Fail deletions of one specific key regardless of namespace.
    pub(crate) fn fail_delete_of(&self, key: &str) {
        self.failing_keys
            .lock()
            .expect("flaky lock")
            .insert(key.to_string());
    }

    fn check(&self, op: Op, namespace: Namespace) -> Result<(), AppError> {
        if self.failing.lock().expect("flaky lock").contains(&(op, namespace)) {
            return Err(AppError::StorageMessage(format!(
                "injected {:?} failure on {}",
                op,
                namespace.as_str()
            )));
        }
        Ok(())
    }
}

impl KvBackend for FlakyBackend {
    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        self.check(Op::Get, namespace)?;
        self.inner.get(namespace, key)
    }

    fn set(&self, namespace: Namespace, key: &str, value: &[u8]) -> Result<(), AppError> {
        self.inner.set(namespace, key, value)
    }

    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, AppError> {
        self.check(Op::Delete, namespace)?;
        if self.failing_keys.lock().expect("flaky lock").contains(key) {
            return Err(AppError::StorageMessage(format!("injected delete failure for {}", key)));
        }
        self.inner.delete(namespace, key)
    }

    fn list_keys(&self, namespace: Namespace) -> Result<Vec<String>, AppError> {
        self.inner.list_keys(namespace)
    }

    fn compare_and_swap(
        &self,
        namespace: Namespace,
        key: &str,
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, AppError> {
        self.check(Op::CompareAndSwap, namespace)?;
        self.inner.compare_and_swap(namespace, key, expected, new)
    }
}

/// Database over a [`FlakyBackend`] with a manual clock.
pub(crate) fn setup_flaky_db() -> (Database, Arc<FlakyBackend>, Arc<ManualClock>) {
    let backend = Arc::new(FlakyBackend::default());
    let clock = Arc::new(ManualClock::at_millis(T0_MILLIS));
    let db = Database::new(backend.clone(), clock.clone(), RateLimitConfig::default());
    (db, backend, clock)
}
