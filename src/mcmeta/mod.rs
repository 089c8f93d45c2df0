use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filesystem::{self, FilesystemError};

/// Pack format written into `pack.mcmeta` (Minecraft 1.20.5 / 1.20.6).
pub const DEFAULT_PACK_FORMAT: u32 = 34;

/// Description written into `pack.mcmeta`.
pub const DEFAULT_DESCRIPTION: &str = "Bitter Harvest GUI Backgrounds - Pale Raven Network";

/// Represents the contents of a `pack.mcmeta` file, which is used in Minecraft resource packs
/// to provide metadata about the pack, such as its format version and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mcmeta {
    /// The `pack` section containing format and description.
    pub pack: PackSection,
}

/// Represents the `pack` section in `pack.mcmeta`, containing the format version and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackSection {
    /// The format version of the resource pack.
    pub pack_format: u32,
    /// A description of the resource pack.
    pub description: String,
}

impl Mcmeta {
    pub fn new(pack_format: u32, description: impl Into<String>) -> Self {
        Self {
            pack: PackSection {
                pack_format,
                description: description.into(),
            },
        }
    }
}

/// Custom error type for `pack.mcmeta` reading and writing.
#[derive(Debug, Error)]
pub enum McmetaError {
    #[error("Failed to read the file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("Missing `pack` section in the mcmeta file")]
    MissingPackSection,
    #[error("Failed to write the file: {0}")]
    WriteError(#[from] FilesystemError),
}

/// Parses a `pack.mcmeta` file and returns its contents as an `Mcmeta` struct.
///
/// # Errors
///
/// Returns an error if the file cannot be read, if the contents cannot be deserialized as JSON,
/// or if the `pack` section is missing.
pub fn parse_resource_pack_mcmeta<P: AsRef<Path>>(path: P) -> Result<Mcmeta, McmetaError> {
    let content = fs::read_to_string(path)?;
    let mcmeta: Mcmeta = serde_json::from_str(&content)?;

    if mcmeta.pack.pack_format == 0 || mcmeta.pack.description.is_empty() {
        return Err(McmetaError::MissingPackSection);
    }

    Ok(mcmeta)
}

/// Writes `pack.mcmeta` at the root of `pack_dir`, replacing any existing one.
pub fn write_pack_mcmeta<P: AsRef<Path>>(pack_dir: P, mcmeta: &Mcmeta) -> Result<(), McmetaError> {
    let json = serde_json::to_string_pretty(mcmeta)?;
    filesystem::write_atomic(pack_dir.as_ref().join("pack.mcmeta"), json.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_temp_mcmeta(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("pack.mcmeta");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, file_path)
    }

    #[test]
    fn parses_valid_mcmeta_file() {
        let mcmeta_content = r#"{
        "pack": {
            "pack_format": 6,
            "description": "A test resource pack"
        }
    }"#;
        let (_dir, file_path) = write_temp_mcmeta(mcmeta_content);
        let mcmeta = parse_resource_pack_mcmeta(&file_path).unwrap();
        assert_eq!(mcmeta.pack.pack_format, 6);
        assert_eq!(mcmeta.pack.description, "A test resource pack");
    }

    #[test]
    fn returns_error_for_missing_file() {
        let result = parse_resource_pack_mcmeta("non_existent_file.mcmeta");
        assert!(result.is_err());
    }

    #[test]
    fn returns_error_for_invalid_json() {
        let mcmeta_content = r#"{
            "pack": {
                "pack_format": "not_a_number",
                "description": "Invalid format"
            }
        }"#;
        let (_dir, file_path) = write_temp_mcmeta(mcmeta_content);
        let result = parse_resource_pack_mcmeta(&file_path);
        assert!(matches!(result, Err(McmetaError::JsonParseError(_))));
    }

    #[test]
    fn returns_error_for_empty_description() {
        let mcmeta_content = r#"{ "pack": { "pack_format": 34, "description": "" } }"#;
        let (_dir, file_path) = write_temp_mcmeta(mcmeta_content);
        let result = parse_resource_pack_mcmeta(&file_path);
        assert!(matches!(result, Err(McmetaError::MissingPackSection)));
    }

    #[test]
    fn writes_mcmeta_that_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let written = Mcmeta::new(DEFAULT_PACK_FORMAT, DEFAULT_DESCRIPTION);

        write_pack_mcmeta(dir.path(), &written).unwrap();

        let parsed = parse_resource_pack_mcmeta(dir.path().join("pack.mcmeta")).unwrap();
        assert_eq!(parsed, written);
    }

    #[test]
    fn write_replaces_existing_mcmeta() {
        let (dir, file_path) = write_temp_mcmeta(r#"{"pack":{"pack_format":15,"description":"ModelEngine"}}"#);

        write_pack_mcmeta(dir.path(), &Mcmeta::new(34, "Merged")).unwrap();

        let parsed = parse_resource_pack_mcmeta(&file_path).unwrap();
        assert_eq!(parsed.pack.pack_format, 34);
        assert_eq!(parsed.pack.description, "Merged");
    }
}
