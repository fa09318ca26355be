//! Origin encodings and key rewriting
//!
//! Chromium namespaces localStorage entries by origin:
//! ```text
//! _<base url>\x00\x01<logical key>   item entry
//! META:<base url>                    namespace marker
//! ```
//! WebSQL directories and tracker rows use the directory token instead.

use serde::{Deserialize, Serialize};

/// Separator between the base URL and the logical key of an item entry.
pub const NAMESPACE_SEPARATOR: &[u8] = b"\x00\x01";

const META_PREFIX: &str = "META:";

/// A `(scheme, host, port)` triple. An empty port means "none".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    #[serde(default)]
    pub port: String,
}

impl Origin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port: port.into(),
        }
    }

    pub fn base_url(&self) -> String {
        base_url(&self.scheme, &self.host, &self.port)
    }

    /// `scheme_host[_port]`, the name of the origin's WebSQL directory.
    pub fn directory_token(&self) -> String {
        let mut token = format!("{}_{}", self.scheme, self.host);
        if !self.port.is_empty() {
            token.push('_');
            token.push_str(&self.port);
        }
        token
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

/// How occurrences of the old base URL inside a key are replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMode {
    /// Every occurrence, including ones inside the logical key.
    #[default]
    Global,
    /// Only the occurrence forming the namespace prefix or meta key.
    PrefixOnly,
}

impl RewriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteMode::Global => "global",
            RewriteMode::PrefixOnly => "prefix",
        }
    }
}

impl std::str::FromStr for RewriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(RewriteMode::Global),
            "prefix" | "prefix_only" => Ok(RewriteMode::PrefixOnly),
            _ => Err(format!("Unknown rewrite mode: {}", s)),
        }
    }
}

/// `scheme://host`, with `:port` appended only when the port is non-empty.
pub fn base_url(scheme: &str, host: &str, port: &str) -> String {
    let mut url = format!("{}://{}", scheme, host);
    if !port.is_empty() {
        url.push(':');
        url.push_str(port);
    }
    url
}

pub fn meta_key(base_url: &str) -> Vec<u8> {
    format!("{}{}", META_PREFIX, base_url).into_bytes()
}

pub fn namespace_prefix(base_url: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(base_url.len() + 1 + NAMESPACE_SEPARATOR.len());
    prefix.push(b'_');
    prefix.extend_from_slice(base_url.as_bytes());
    prefix.extend_from_slice(NAMESPACE_SEPARATOR);
    prefix
}

/// Exact-byte prefix match, or exact equality with the meta key.
pub fn belongs_to_namespace(key: &[u8], prefix: &[u8], meta_key: &[u8]) -> bool {
    key.starts_with(prefix) || key == meta_key
}

/// Replace every non-overlapping occurrence of `old_base`, scanning left to right.
pub fn rewrite(key: &[u8], old_base: &str, new_base: &str) -> Vec<u8> {
    let needle = old_base.as_bytes();
    if needle.is_empty() {
        return key.to_vec();
    }

    let mut out = Vec::with_capacity(key.len());
    let mut rest = key;
    while let Some(pos) = find(rest, needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(new_base.as_bytes());
        rest = &rest[pos + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}

/// Replace only the namespace occurrence of `old_base`: the one directly
/// after the leading `_` of an item entry or after `META:` of a marker.
/// Keys outside the old namespace are returned unchanged.
pub fn rewrite_prefix(key: &[u8], old_base: &str, new_base: &str) -> Vec<u8> {
    let old_prefix = namespace_prefix(old_base);
    if let Some(logical) = key.strip_prefix(old_prefix.as_slice()) {
        let mut out = namespace_prefix(new_base);
        out.extend_from_slice(logical);
        return out;
    }
    if key == meta_key(old_base).as_slice() {
        return meta_key(new_base);
    }
    key.to_vec()
}

pub fn rewrite_with(mode: RewriteMode, key: &[u8], old_base: &str, new_base: &str) -> Vec<u8> {
    match mode {
        RewriteMode::Global => rewrite(key, old_base, new_base),
        RewriteMode::PrefixOnly => rewrite_prefix(key, old_base, new_base),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
