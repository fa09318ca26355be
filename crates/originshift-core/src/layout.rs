//! On-disk locations of the webview's storage under the app data root

use std::path::{Path, PathBuf};

const WEBVIEW_DIR: &str = "app_webview";
const LOCAL_STORAGE_DIR: &str = "Local Storage";
const LEVELDB_DIR: &str = "leveldb";
const DATABASES_DIR: &str = "databases";
const REFERENCE_DB: &str = "Databases.db";
const JOURNAL_FILE: &str = ".originshift-journal.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new<P: Into<PathBuf>>(data_root: P) -> Self {
        Self {
            root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.root
    }

    pub fn webview_dir(&self) -> PathBuf {
        self.root.join(WEBVIEW_DIR)
    }

    pub fn local_storage_dir(&self) -> PathBuf {
        self.webview_dir().join(LOCAL_STORAGE_DIR).join(LEVELDB_DIR)
    }

    pub fn databases_dir(&self) -> PathBuf {
        self.webview_dir().join(DATABASES_DIR)
    }

    pub fn reference_db(&self) -> PathBuf {
        self.databases_dir().join(REFERENCE_DB)
    }

    pub fn websql_dir(&self, token: &str) -> PathBuf {
        self.databases_dir().join(token)
    }

    pub fn journal(&self) -> PathBuf {
        self.databases_dir().join(JOURNAL_FILE)
    }
}
