//! Migration configuration
//!
//! Resolved once from the host's preferences into an immutable
//! [`MigrationConfig`] that is passed by reference to every migrator.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::origin::{Origin, RewriteMode};
use crate::{MigrationError, Result};

pub const PREF_SCHEME: &str = "Scheme";
pub const PREF_HOSTNAME: &str = "Hostname";
pub const PREF_PORT: &str = "WKPort";
pub const PREF_PREVIOUS_SCHEME: &str = "PreviousScheme";
pub const PREF_PREVIOUS_HOSTNAME: &str = "PreviousHostname";
pub const PREF_PREVIOUS_PORT: &str = "PreviousPort";
pub const PREF_MIGRATE_WEBSQL: &str = "MigrateWebSQL";
pub const PREF_REWRITE_MODE: &str = "LocalStorageRewrite";

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Pages were served from `file://` before the origin became configurable.
pub const LEGACY_SCHEME: &str = "file";
pub const LEGACY_HOSTNAME: &str = "";
pub const LEGACY_PORT: &str = "";

/// WebSQL directory Chromium uses for `file://` pages.
pub const LEGACY_WEBSQL_DIR_NAME: &str = "file__0";

/// Read-only view of the host's string preferences.
pub trait Preferences {
    fn get(&self, name: &str) -> Option<String>;
}

impl Preferences for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl Preferences for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

/// Unresolved settings as a host may store them, e.g. in a JSON config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MigrationSettings {
    pub scheme: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<String>,
    pub previous_scheme: Option<String>,
    pub previous_hostname: Option<String>,
    pub previous_port: Option<String>,
    pub migrate_websql: Option<bool>,
    pub rewrite_mode: Option<RewriteMode>,
}

impl MigrationSettings {
    pub fn from_preferences<P: Preferences + ?Sized>(prefs: &P) -> Result<Self> {
        let migrate_websql = match non_empty(prefs.get(PREF_MIGRATE_WEBSQL)) {
            Some(value) => Some(parse_bool(PREF_MIGRATE_WEBSQL, &value)?),
            None => None,
        };
        let rewrite_mode = match non_empty(prefs.get(PREF_REWRITE_MODE)) {
            Some(value) => Some(
                value
                    .parse::<RewriteMode>()
                    .map_err(MigrationError::InvalidConfig)?,
            ),
            None => None,
        };

        Ok(Self {
            scheme: prefs.get(PREF_SCHEME),
            hostname: prefs.get(PREF_HOSTNAME),
            port: prefs.get(PREF_PORT),
            previous_scheme: prefs.get(PREF_PREVIOUS_SCHEME),
            previous_hostname: prefs.get(PREF_PREVIOUS_HOSTNAME),
            previous_port: prefs.get(PREF_PREVIOUS_PORT),
            migrate_websql,
            rewrite_mode,
        })
    }

    /// Apply defaults. Empty strings count as unset.
    pub fn resolve(self) -> MigrationConfig {
        let target = Origin::new(
            or_default(self.scheme, DEFAULT_SCHEME),
            or_default(self.hostname, DEFAULT_HOSTNAME),
            or_default(self.port, ""),
        );
        let previous = Origin::new(
            or_default(self.previous_scheme, LEGACY_SCHEME),
            or_default(self.previous_hostname, LEGACY_HOSTNAME),
            or_default(self.previous_port, LEGACY_PORT),
        );

        MigrationConfig {
            previous,
            target,
            migrate_websql: self.migrate_websql.unwrap_or(true),
            rewrite_mode: self.rewrite_mode.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub previous: Origin,
    pub target: Origin,
    /// False for deployment variants whose webview has no WebSQL.
    pub migrate_websql: bool,
    pub rewrite_mode: RewriteMode,
}

impl MigrationConfig {
    pub fn new(previous: Origin, target: Origin) -> Self {
        Self {
            previous,
            target,
            migrate_websql: true,
            rewrite_mode: RewriteMode::default(),
        }
    }

    pub fn from_preferences<P: Preferences + ?Sized>(prefs: &P) -> Result<Self> {
        Ok(MigrationSettings::from_preferences(prefs)?.resolve())
    }

    /// Directory holding the previous origin's WebSQL databases.
    pub fn legacy_directory_token(&self) -> String {
        if self.previous.scheme == LEGACY_SCHEME {
            LEGACY_WEBSQL_DIR_NAME.to_string()
        } else {
            self.previous.directory_token()
        }
    }

    pub fn target_directory_token(&self) -> String {
        self.target.directory_token()
    }

    pub fn is_same_origin(&self) -> bool {
        self.previous == self.target
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        MigrationSettings::default().resolve()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn or_default(value: Option<String>, default: &str) -> String {
    non_empty(value).unwrap_or_else(|| default.to_string())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(MigrationError::InvalidConfig(format!(
            "{} must be a boolean, got {:?}",
            name, value
        ))),
    }
}
