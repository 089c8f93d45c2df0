use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::filesystem::{self, FilesystemError};

/// Custom error type for `update_plugin_config`.
#[derive(Debug, Error)]
pub enum PluginConfigError {
    #[error("plugin config not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read the file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("plugin config root is not a mapping")]
    NotAMapping,
    #[error("Failed to write the file: {0}")]
    WriteError(#[from] FilesystemError),
}

/// Section of the plugin's `config.yml` holding resource pack settings.
pub const RESOURCEPACK_SECTION: &str = "resourcepack";

/// Sets `resourcepack.enabled`, `resourcepack.url` and `resourcepack.sha1`
/// in the YAML document `content`, leaving every other key in place.
pub fn apply_resource_pack(content: &str, url: &str, sha1: &str) -> Result<String, PluginConfigError> {
    let mut root = if content.trim().is_empty() {
        Value::Mapping(Mapping::new())
    } else {
        serde_yaml::from_str::<Value>(content)?
    };
    if root.is_null() {
        root = Value::Mapping(Mapping::new());
    }
    let root_map = root.as_mapping_mut().ok_or(PluginConfigError::NotAMapping)?;

    let key = Value::String(RESOURCEPACK_SECTION.to_string());
    if !root_map.get(&key).is_some_and(Value::is_mapping) {
        root_map.insert(key.clone(), Value::Mapping(Mapping::new()));
    }
    if let Some(section) = root_map.get_mut(&key).and_then(Value::as_mapping_mut) {
        section.insert("enabled".into(), Value::Bool(true));
        section.insert("url".into(), url.into());
        section.insert("sha1".into(), sha1.into());
    }

    Ok(serde_yaml::to_string(&root)?)
}

/// Updates the plugin's `config.yml` on disk with the new pack URL and SHA-1.
///
/// # Errors
///
/// Returns `PluginConfigError::NotFound` when the file is missing, or a
/// parse error when it is not valid YAML. The file is only rewritten once the
/// new document has been produced.
pub fn update_plugin_config<P: AsRef<Path>>(path: P, url: &str, sha1: &str) -> Result<(), PluginConfigError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PluginConfigError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let updated = apply_resource_pack(&content, url, sha1)?;
    filesystem::write_atomic(path, updated.as_bytes())?;

    info!(path = %path.display(), "updated resourcepack.url, resourcepack.sha1 and enabled resourcepack");
    Ok(())
}
