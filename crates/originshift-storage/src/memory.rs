//! In-memory store with shared state
//!
//! Clones share the same records, so a handle closed by a migration can be
//! inspected afterwards through another clone.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::kv::{KeyValueStore, Record, Records, WriteBatch};
use crate::{Result, StorageError};

#[derive(Default)]
struct Inner {
    records: BTreeMap<Vec<u8>, Vec<u8>>,
    commits: usize,
    puts: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    closed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            for (key, value) in records {
                inner.records.insert(key.into(), value.into());
            }
        }
        store
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().records.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.inner.lock().records.keys().cloned().collect()
    }

    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.inner.lock().records.clone()
    }

    /// Number of batches committed through [`KeyValueStore::write`].
    pub fn commit_count(&self) -> usize {
        self.inner.lock().commits
    }

    /// Number of individual puts applied through committed batches.
    pub fn put_count(&self) -> usize {
        self.inner.lock().puts
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            closed: false,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn contains(&mut self, key: &[u8]) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.inner.lock().records.contains_key(key))
    }

    fn records(&mut self) -> Result<Records<'_>> {
        self.ensure_open()?;
        let snapshot: Vec<Result<Record>> = self
            .inner
            .lock()
            .records
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn write(&mut self, batch: WriteBatch) -> Result<()> {
        self.ensure_open()?;
        let mut inner = self.inner.lock();
        inner.commits += 1;
        inner.puts += batch.len();
        for (key, value) in batch {
            inner.records.insert(key, value);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
