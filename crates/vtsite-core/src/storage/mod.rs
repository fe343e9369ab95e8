//! # Settings Storage
//!
//! Flat string-to-string storage behind the settings layer. Stores know
//! nothing about the schema: sanitizing and defaults live in
//! [`crate::settings`].
//!
//! Two backends:
//! - [`MemoryStore`]: `BTreeMap`, volatile
//! - [`RedbStore`]: redb embedded database, one ACID transaction per write

mod redb_store;

pub use redb_store::RedbStore;

use crate::SiteError;
use std::collections::BTreeMap;

/// Raw key-value persistence for settings.
///
/// Every write is immediate and independent. There is no batching and no
/// versioning: the last write for a key wins.
pub trait SettingsStore: Send + Sync {
    /// Stored text for `key`, if any.
    fn get_raw(&self, key: &str) -> Result<Option<String>, SiteError>;

    /// Persist `value` under `key`, replacing what was there.
    fn put_raw(&mut self, key: &str, value: &str) -> Result<(), SiteError>;

    /// Delete `key`. Returns whether it existed.
    fn remove(&mut self, key: &str) -> Result<bool, SiteError>;

    /// All stored entries in key order.
    fn entries(&self) -> Result<Vec<(String, String)>, SiteError>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, SiteError> {
        Ok(self.values.get(key).cloned())
    }

    fn put_raw(&mut self, key: &str, value: &str) -> Result<(), SiteError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, SiteError> {
        Ok(self.values.remove(key).is_some())
    }

    fn entries(&self) -> Result<Vec<(String, String)>, SiteError> {
        Ok(self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
