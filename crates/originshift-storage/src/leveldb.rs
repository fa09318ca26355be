//! LevelDB-backed store, the on-disk format Chromium uses for `Local Storage/leveldb`

use rusty_leveldb::{DBIterator, LdbIterator, Options, DB};
use std::path::{Path, PathBuf};

use crate::kv::{KeyValueStore, Record, Records, WriteBatch};
use crate::{Result, StorageError};

pub struct LevelDbStore {
    db: Option<DB>,
    path: PathBuf,
}

impl LevelDbStore {
    /// Open an existing database. Never creates one: a missing directory is
    /// reported as [`StorageError::NotFound`], and a database held by another
    /// process fails with [`StorageError::Locked`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(StorageError::NotFound(path));
        }

        let mut options = Options::default();
        options.create_if_missing = false;
        let db = DB::open(&path, options)?;
        tracing::debug!(path = %path.display(), "Opened LevelDB store");

        Ok(Self { db: Some(db), path })
    }

    /// Open a database, creating it when absent.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut options = Options::default();
        options.create_if_missing = true;
        let db = DB::open(&path, options)?;

        Ok(Self { db: Some(db), path })
    }

    /// Read a single value.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db()?.get(key))
    }

    /// Write a single value outside of any migration batch.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db()?.put(key, value)?;
        Ok(())
    }

    fn db(&mut self) -> Result<&mut DB> {
        self.db.as_mut().ok_or(StorageError::Closed)
    }
}

impl KeyValueStore for LevelDbStore {
    fn contains(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.db()?.get(key).is_some())
    }

    fn records(&mut self) -> Result<Records<'_>> {
        let iter = self.db()?.new_iter()?;
        Ok(Box::new(LevelDbRecords {
            iter,
            started: false,
        }))
    }

    fn write(&mut self, batch: WriteBatch) -> Result<()> {
        let mut staged = rusty_leveldb::WriteBatch::new();
        for (key, value) in batch.iter() {
            staged.put(key, value);
        }
        // Synced so a crash right after the commit cannot lose the batch.
        self.db()?.write(staged, true)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut db) = self.db.take() {
            db.close()?;
            tracing::debug!(path = %self.path.display(), "Closed LevelDB store");
        }
        Ok(())
    }
}

impl Drop for LevelDbStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!(path = %self.path.display(), error = %e, "LevelDB close on drop failed");
        }
    }
}

struct LevelDbRecords {
    iter: DBIterator,
    started: bool,
}

impl Iterator for LevelDbRecords {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let positioned = if self.started {
            self.iter.advance()
        } else {
            self.started = true;
            self.iter.seek_to_first();
            self.iter.valid()
        };
        if !positioned {
            return None;
        }

        let mut key = Vec::new();
        let mut value = Vec::new();
        if self.iter.current(&mut key, &mut value) {
            Some(Ok((key, value)))
        } else {
            None
        }
    }
}
