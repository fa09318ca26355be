//! WebSQL reference database (`Databases.db`)
//!
//! Chromium tracks every WebSQL database in a `Databases` table keyed by the
//! origin's directory token. Only the `origin` column is touched here.

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::{Result, StorageError};

pub struct ReferenceDatabase {
    conn: Option<Connection>,
    path: PathBuf,
}

impl ReferenceDatabase {
    /// Open an existing reference database read-write. The file is never
    /// created and its journal mode is left as the webview configured it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(StorageError::NotFound(path));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!(path = %path.display(), "Opened reference database");

        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    /// Create a reference database with the webview's tracker schema.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS Databases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                origin TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                estimated_size INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS origin_index ON Databases (origin);
            CREATE UNIQUE INDEX IF NOT EXISTS unique_index ON Databases (origin, name);
        "#,
        )?;

        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.as_ref().ok_or(StorageError::Closed)?;
        f(conn)
    }

    pub fn transaction<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.as_mut().ok_or(StorageError::Closed)?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Point every row tracked under `from` at `to`. Returns the number of
    /// rows changed; re-running after success changes nothing.
    pub fn rename_origin(&mut self, from: &str, to: &str) -> Result<usize> {
        self.transaction(|conn| {
            let changed = conn.execute(
                "UPDATE Databases SET origin = ?1 WHERE origin = ?2",
                rusqlite::params![to, from],
            )?;
            Ok(changed)
        })
    }

    /// Distinct origin tokens currently tracked.
    pub fn origins(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT origin FROM Databases ORDER BY origin")?;
            let origins = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(origins)
        })
    }

    pub fn insert_database(
        &self,
        origin: &str,
        name: &str,
        description: &str,
        estimated_size: i64,
    ) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO Databases (origin, name, description, estimated_size) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![origin, name, description, estimated_size],
            )?;
            Ok(())
        })
    }

    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StorageError::Database(e))?;
            tracing::debug!(path = %self.path.display(), "Closed reference database");
        }
        Ok(())
    }
}

impl Drop for ReferenceDatabase {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!(path = %self.path.display(), error = %e, "Reference database close on drop failed");
        }
    }
}
