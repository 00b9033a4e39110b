//! redb-backed key-value store.

use super::{KvBackend, Namespace};
use crate::db::tables::{table_for, PASTES, PASTES_META, RATE_LIMITS, REDB_FILE_NAME};
use crate::error::AppError;
use redb::{ReadableDatabase, ReadableTable};
use std::path::Path;
use std::sync::Arc;

/// Key-value backend over a single redb file.
///
/// Each call runs in its own transaction. redb serializes write
/// transactions, so [`KvBackend::compare_and_swap`] is a true
/// check-and-write even across threads.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<redb::Database>,
}

impl RedbBackend {
    /// Open (or create) the store inside the data directory `path`.
    ///
    /// # Returns
    /// A backend with every namespace table initialized.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created, the file is
    /// held by another process, or table initialization fails.
    pub fn open(path: &str) -> Result<Self, AppError> {
        let dir = Path::new(path);
        std::fs::create_dir_all(dir).map_err(|err| {
            AppError::StorageMessage(format!(
                "Failed to create data directory '{}': {}",
                dir.display(),
                err
            ))
        })?;

        let file = dir.join(REDB_FILE_NAME);
        let db = match redb::Database::create(&file) {
            Ok(db) => db,
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                return Err(AppError::StorageMessage(format!(
                    "Database '{}' is already open by another LogPaste process.\n\
                    Stop it first, or set DB_PATH to a different location.",
                    file.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };

        let write_txn = db.begin_write()?;
        write_txn.open_table(PASTES)?;
        write_txn.open_table(PASTES_META)?;
        write_txn.open_table(RATE_LIMITS)?;
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KvBackend for RedbBackend {
    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_for(namespace))?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn set(&self, namespace: Namespace, key: &str, value: &[u8]) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table_for(namespace))?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(table_for(namespace))?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn list_keys(&self, namespace: Namespace) -> Result<Vec<String>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_for(namespace))?;
        let mut keys = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    fn compare_and_swap(
        &self,
        namespace: Namespace,
        key: &str,
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        let swapped = {
            let mut table = write_txn.open_table(table_for(namespace))?;
            let current = table.get(key)?.map(|guard| guard.value().to_vec());
            if current.as_deref() == expected {
                table.insert(key, new)?;
                true
            } else {
                false
            }
        };
        if swapped {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(swapped)
    }
}
