use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::filesystem::{self, FilesystemError};
use crate::pack_identity::derive_identity_string;

/// Key holding the resource pack download URL.
pub const RESOURCE_PACK_KEY: &str = "resource-pack";
/// Key holding the resource pack SHA-1.
pub const RESOURCE_PACK_SHA1_KEY: &str = "resource-pack-sha1";
/// Key holding the resource pack UUID.
pub const RESOURCE_PACK_ID_KEY: &str = "resource-pack-id";

/// Errors raised while patching a properties file on disk.
#[derive(Debug, Error)]
pub enum PropertiesError {
    #[error("properties file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read properties file: {0}")]
    Read(#[from] io::Error),
    #[error("failed to write properties file: {0}")]
    Write(#[from] FilesystemError),
}

/// Ordered set of keys the patcher enforces, with the value each must carry.
///
/// Iteration follows insertion order, which is also the order in which absent
/// keys get appended to a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagedKeys {
    entries: Vec<(String, String)>,
}

impl ManagedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. Re-inserting a key replaces its value but keeps
    /// its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value(&self, key: &str) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ManagedKeys {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut keys = ManagedKeys::new();
        for (k, v) in iter {
            keys.insert(k, v);
        }
        keys
    }
}

/// A properties file held as raw lines, without their terminators.
///
/// Each original line keeps its own terminator on render. Lines added by
/// patching, and an unterminated last line, use the terminator of the last
/// terminated line in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertiesDocument {
    pub lines: Vec<String>,
    endings: Vec<&'static str>,
    default_ending: &'static str,
}

impl PropertiesDocument {
    /// Splits `content` into lines, remembering how each one was terminated.
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();
        let mut endings = Vec::new();
        let mut default_ending = "\n";

        for chunk in content.split_inclusive('\n') {
            if let Some(line) = chunk.strip_suffix("\r\n") {
                lines.push(line.to_string());
                endings.push("\r\n");
                default_ending = "\r\n";
            } else if let Some(line) = chunk.strip_suffix('\n') {
                lines.push(line.to_string());
                endings.push("\n");
                default_ending = "\n";
            } else {
                lines.push(chunk.to_string());
            }
        }

        Self {
            lines,
            endings,
            default_ending,
        }
    }

    /// Returns a copy of the document with `managed` enforced.
    pub fn patched(&self, managed: &ManagedKeys) -> Self {
        Self {
            lines: patch_properties(&self.lines, managed),
            endings: self.endings.clone(),
            default_ending: self.default_ending,
        }
    }

    /// Joins the lines back together, terminating every line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(line);
            out.push_str(self.endings.get(i).copied().unwrap_or(self.default_ending));
        }
        out
    }
}

/// Splits a `key=value` line on the first `=`, returning the trimmed key.
fn split_key(line: &str) -> Option<&str> {
    line.split_once('=').map(|(key, _)| key.trim())
}

/// Rewrites every line whose key is managed and appends the managed keys that
/// were never seen. Comments, blank lines, unknown keys and lines without `=`
/// are passed through untouched and keep their position.
///
/// Applying the same `managed` set twice gives the same output as once.
pub fn patch_properties<S: AsRef<str>>(lines: &[S], managed: &ManagedKeys) -> Vec<String> {
    let mut satisfied: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(lines.len() + managed.len());

    for line in lines {
        let line = line.as_ref();
        let stripped = line.trim();

        if stripped.is_empty() || stripped.starts_with('#') {
            out.push(line.to_string());
            continue;
        }

        match split_key(stripped).and_then(|key| managed.get_key_value(key)) {
            Some((key, value)) => {
                out.push(format!("{key}={value}"));
                satisfied.insert(key);
            }
            None => out.push(line.to_string()),
        }
    }

    for (key, value) in managed.iter() {
        if !satisfied.contains(key) {
            out.push(format!("{key}={value}"));
        }
    }

    out
}

/// Escapes `:` as `\:` for a properties value.
///
/// Colons that are already escaped are left as they are, so escaping a value
/// twice does not produce `\\:`.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_backslash = false;
    for c in value.chars() {
        if c == ':' && !prev_backslash {
            out.push('\\');
        }
        prev_backslash = c == '\\' && !prev_backslash;
        out.push(c);
    }
    out
}

/// The three `server.properties` keys that point a server at a resource pack.
pub fn resource_pack_keys(url: &str, sha1: &str) -> ManagedKeys {
    let mut keys = ManagedKeys::new();
    keys.insert(RESOURCE_PACK_KEY, escape_value(url));
    keys.insert(RESOURCE_PACK_SHA1_KEY, sha1);
    keys.insert(RESOURCE_PACK_ID_KEY, derive_identity_string(sha1));
    keys
}

/// Points `server.properties` at a new pack, touching only the resource pack
/// keys.
///
/// # Errors
///
/// Returns `PropertiesError::NotFound` if the file does not exist; nothing is
/// written in that case or when reading fails.
pub fn update_server_properties<P: AsRef<Path>>(
    path: P,
    url: &str,
    sha1: &str,
) -> Result<ManagedKeys, PropertiesError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PropertiesError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let managed = resource_pack_keys(url, sha1);
    let patched = PropertiesDocument::parse(&content).patched(&managed);
    filesystem::write_atomic(path, patched.render().as_bytes())?;

    info!(path = %path.display(), "updated resource-pack URL");
    info!("updated resource-pack-sha1");
    if let Some(id) = managed.get(RESOURCE_PACK_ID_KEY) {
        info!(id, "updated resource-pack-id");
    }
    Ok(managed)
}
