use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::filesystem::{self, FilesystemError, expand_home};

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_PACK_CONFIG: &str = "pack_config.json";

#[derive(Debug, Error)]
pub enum PackConfigError {
    #[error("Failed to read the file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("Failed to write the file: {0}")]
    WriteError(#[from] FilesystemError),
}

/// Persistent build settings, stored as `pack_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub mc_packs_api_key: String,
    pub github_token: String,
    pub github_repo: String,
    /// Path to the plugin's `config.yml`.
    pub server_config_path: String,
    /// Path to the server's `server.properties`.
    pub server_properties_path: String,
    /// Publish on every build, as if `--publish` were passed.
    pub auto_publish: bool,
    /// Update server configs on every build, as if `--update-config` were passed.
    pub auto_update_config: bool,
    /// Extra location to look for the ModelEngine pack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modelengine_pack: Option<String>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            mc_packs_api_key: String::new(),
            github_token: String::new(),
            github_repo: String::new(),
            server_config_path: "../TestServer/plugins/BitterHarvest/config.yml".to_string(),
            server_properties_path: "../TestServer/server.properties".to_string(),
            auto_publish: false,
            auto_update_config: false,
            modelengine_pack: None,
        }
    }
}

impl PackConfig {
    /// Loads settings from `path`, falling back to defaults when the file does
    /// not exist. Fields missing from the file take their default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PackConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes settings to `path` as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PackConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        filesystem::write_atomic(path, json.as_bytes())?;
        info!(path = %path.display(), "saved pack config");
        Ok(())
    }

    pub fn server_config_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.server_config_path)
    }

    pub fn server_properties_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.server_properties_path)
    }

    pub fn modelengine_pack(&self) -> Option<PathBuf> {
        self.modelengine_pack.as_deref().and_then(non_empty_path)
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(expand_home(trimmed))
    }
}
