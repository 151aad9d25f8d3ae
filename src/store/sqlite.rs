//! SQLite-backed key-value store

use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;

use super::{Entries, KvStore, SCHEMA};
use crate::error::Result;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn get_all(&self) -> Result<Entries> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Entries::new();
        for row in rows {
            let (key, raw) = row?;
            entries.insert(key, serde_json::from_str::<Value>(&raw)?);
        }
        Ok(entries)
    }
}

impl KvStore for SqliteStore {
    fn get(&self, keys: Option<&[String]>) -> Result<Entries> {
        let Some(keys) = keys else {
            return self.get_all();
        };

        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?")?;
        let mut entries = Entries::new();
        for key in keys {
            let raw: Option<String> = match stmt.query_row(params![key], |row| row.get(0)) {
                Ok(value) => Some(value),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };
            if let Some(raw) = raw {
                entries.insert(key.clone(), serde_json::from_str(&raw)?);
            }
        }
        Ok(entries)
    }

    fn set(&mut self, entries: Entries) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = datetime('now')",
            )?;
            for (key, value) in &entries {
                stmt.execute(params![key, serde_json::to_string(value)?])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, keys: &[String]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM kv WHERE key = ?")?;
            for key in keys {
                stmt.execute(params![key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
