//! # redb-backed Settings Storage
//!
//! A disk-backed settings store using the redb embedded database:
//! - ACID transactions (one per write)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! The whole database is a single table of `&str -> &str`.

use super::SettingsStore;
use crate::SiteError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for settings: key -> stored text.
const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");

/// A disk-backed settings store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

fn io_err(e: impl std::fmt::Display) -> SiteError {
    SiteError::IoError(e.to_string())
}

impl RedbStore {
    /// Open or create a settings database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SiteError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Create the table up front so read transactions never miss it.
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(SETTINGS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }
}

impl SettingsStore for RedbStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, SiteError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SETTINGS).map_err(io_err)?;
        Ok(table
            .get(key)
            .map_err(io_err)?
            .map(|guard| guard.value().to_string()))
    }

    fn put_raw(&mut self, key: &str, value: &str) -> Result<(), SiteError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(SETTINGS).map_err(io_err)?;
            table.insert(key, value).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn remove(&mut self, key: &str) -> Result<bool, SiteError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let existed = {
            let mut table = write_txn.open_table(SETTINGS).map_err(io_err)?;
            table.remove(key).map_err(io_err)?.is_some()
        };
        write_txn.commit().map_err(io_err)?;
        Ok(existed)
    }

    fn entries(&self) -> Result<Vec<(String, String)>, SiteError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SETTINGS).map_err(io_err)?;

        let mut entries = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, value) = entry.map_err(io_err)?;
            entries.push((key.value().to_string(), value.value().to_string()));
        }
        Ok(entries)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("site.redb")).expect("open db");

        assert!(store.get_raw("tagline").expect("get").is_none());
        store.put_raw("tagline", "Singer").expect("put");
        assert_eq!(store.get_raw("tagline").expect("get").as_deref(), Some("Singer"));

        assert!(store.remove("tagline").expect("remove"));
        assert!(store.get_raw("tagline").expect("get").is_none());
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("site.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store.put_raw("vtuber_name", "Rin").expect("put");
            store
                .put_raw("achievements_personal", r#"[{"title":"Debut"}]"#)
                .expect("put");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        let entries = store.entries().expect("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "achievements_personal");
        assert_eq!(store.get_raw("vtuber_name").expect("get").as_deref(), Some("Rin"));
    }
}
