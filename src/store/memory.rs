use super::{Entries, KvStore};
use crate::error::Result;

/// In-process store. Contents are lost with the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Entries,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, keys: Option<&[String]>) -> Result<Entries> {
        Ok(match keys {
            None => self.entries.clone(),
            Some(keys) => keys
                .iter()
                .filter_map(|k| self.entries.get(k).map(|v| (k.clone(), v.clone())))
                .collect(),
        })
    }

    fn set(&mut self, entries: Entries) -> Result<()> {
        self.entries.extend(entries);
        Ok(())
    }

    fn remove(&mut self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }
}
