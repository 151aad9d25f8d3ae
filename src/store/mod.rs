//! Durable key-value storage
//!
//! The tracker persists everything through the flat [`KvStore`] contract:
//! get by keys (or everything), set a map, remove keys. Atomicity is per key
//! only. Two backends:
//! - [`SqliteStore`]: on-disk, used by the CLI
//! - [`MemoryStore`]: in-process, used by tests and throwaway sessions

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use schema::SCHEMA;
pub use sqlite::SqliteStore;

use serde_json::Value;
use std::collections::BTreeMap;

use crate::browser::TabId;
use crate::error::Result;

/// Flat map of stored entries, ordered by key
pub type Entries = BTreeMap<String, Value>;

pub trait KvStore {
    /// Fetch the given keys, or every entry when `keys` is `None`.
    /// Missing keys are simply absent from the result.
    fn get(&self, keys: Option<&[String]>) -> Result<Entries>;

    fn set(&mut self, entries: Entries) -> Result<()>;

    fn remove(&mut self, keys: &[String]) -> Result<()>;

    /// Fetch a single key
    fn get_one(&self, key: &str) -> Result<Option<Value>> {
        let mut found = self.get(Some(&[key.to_string()]))?;
        Ok(found.remove(key))
    }
}

// ============================================
// KEY NAMESPACE
// ============================================

pub mod keys {
    use super::TabId;

    pub const INSTANCE_PREFIX: &str = "instance_";

    /// Last bulk-close batch, consumed by undo
    pub const UNDO_LAST_CLOSE: &str = "undo_last_close";

    pub fn instance(fingerprint: &str) -> String {
        format!("{}{}", INSTANCE_PREFIX, fingerprint)
    }

    pub fn tab_created(tab_id: TabId) -> String {
        format!("tab_{}_created", tab_id)
    }

    /// Parse the tab id back out of a `tab_<id>_created` key
    pub fn parse_tab_created(key: &str) -> Option<TabId> {
        key.strip_prefix("tab_")?
            .strip_suffix("_created")?
            .parse()
            .ok()
    }

    pub fn url_first_seen(url: &str) -> String {
        format!("url_{}_first_seen", url)
    }
}
