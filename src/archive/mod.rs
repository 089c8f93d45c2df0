use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::filesystem::{self, FilesystemError, RemoveOptions};

/// Where the ModelEngine plugin writes its generated pack, relative to the
/// working directory.
pub const DEFAULT_BASE_PACK_SEARCH_PATHS: [&str; 1] = ["../TestServer/plugins/ModelEngine/resource pack.zip"];

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
    #[error("{0} is not inside the build directory")]
    OutsideBuildDir(PathBuf),
}

/// Returns the first candidate that exists, canonicalized.
pub fn find_base_pack<I, P>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    candidates
        .into_iter()
        .find(|p| p.as_ref().exists())
        .map(|p| p.as_ref().canonicalize().unwrap_or_else(|_| p.as_ref().to_path_buf()))
}

/// Lays the base pack out in `build_dir`.
///
/// A `.zip` source is extracted; a directory is copied. Returns `false` when
/// there is nothing to merge and the pack will be standalone.
pub fn merge_base_pack(source: Option<&Path>, build_dir: &Path) -> Result<bool, ArchiveError> {
    let source = match source {
        Some(s) if s.exists() => s,
        _ => {
            warn!("no ModelEngine pack, creating standalone pack");
            return Ok(false);
        }
    };

    info!(source = %source.display(), "merging base pack");
    let is_zip = source
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));

    if is_zip {
        let mut archive = ZipArchive::new(File::open(source)?)?;
        archive.extract(build_dir)?;
        debug!(entries = archive.len(), "extracted base pack");
    } else {
        let copied = filesystem::copy_dir_recursive(source, build_dir)?;
        debug!(files = copied, "copied base pack");
    }
    Ok(true)
}

/// Zips every file under `build_dir` into `out` and returns the archive's
/// lowercase hex SHA-1.
///
/// Entries are added in sorted order with a fixed timestamp, so the same tree
/// always produces the same bytes and therefore the same hash.
pub fn create_archive(build_dir: &Path, out: &Path) -> Result<String, ArchiveError> {
    filesystem::remove_if_exists(out, RemoveOptions::default())?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        filesystem::create_if_not_exists(parent)?;
    }

    let mut writer = ZipWriter::new(File::create(out)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut buffer = Vec::new();
    for entry in WalkDir::new(build_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry_name(build_dir, entry.path())?;
        writer.start_file(name, options)?;
        buffer.clear();
        File::open(entry.path())?.read_to_end(&mut buffer)?;
        writer.write_all(&buffer)?;
    }
    writer.finish()?;

    Ok(sha1_file(out)?)
}

/// Archive name for `path`: relative to `root`, `/`-separated.
fn entry_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ArchiveError::OutsideBuildDir(path.to_path_buf()))?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Ok(parts.join("/"))
}

/// Computes the lowercase hex SHA-1 of a file.
pub fn sha1_file(path: &Path) -> io::Result<String> {
    let f = File::open(path)?;
    let mut reader = BufReader::new(f);
    let mut hasher = Sha1::new();

    let mut buffer = [0u8; 8192];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize().to_vec()))
}

/// Verifies the SHA-1 of a file against an expected hex string.
///
/// # Returns
///
/// * `io::Result<bool>` - `Ok(true)` if the hash matches (case-insensitive), `Ok(false)` otherwise.
pub fn verify_sha1(path: &Path, expected: &str) -> io::Result<bool> {
    Ok(sha1_file(path)?.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("assets/bitterharvest/font")).unwrap();
        fs::write(root.join("assets/bitterharvest/font/gui.json"), "{}").unwrap();
        fs::write(root.join("pack.mcmeta"), "{\"pack\":{}}").unwrap();
    }

    #[test]
    fn sha1_of_empty_file_matches_known_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();
        assert_eq!(sha1_file(&path).unwrap(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert!(verify_sha1(&path, "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709").unwrap());
        assert!(!verify_sha1(&path, "00").unwrap());
    }

    #[test]
    fn archive_contains_relative_slash_separated_entries() {
        let build = tempdir().unwrap();
        sample_tree(build.path());
        let out_dir = tempdir().unwrap();
        let out = out_dir.path().join("pack.zip");

        let sha1 = create_archive(build.path(), &out).unwrap();
        assert_eq!(sha1.len(), 40);
        assert_eq!(sha1, sha1_file(&out).unwrap());

        let mut archive = ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["assets/bitterharvest/font/gui.json", "pack.mcmeta"]);

        let mut contents = String::new();
        archive.by_name("pack.mcmeta").unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "{\"pack\":{}}");
    }

    #[test]
    fn identical_trees_produce_identical_hashes() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        sample_tree(a.path());
        sample_tree(b.path());
        let out = tempdir().unwrap();

        let first = create_archive(a.path(), &out.path().join("a.zip")).unwrap();
        let second = create_archive(b.path(), &out.path().join("b.zip")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn merges_zip_and_directory_sources() {
        let src = tempdir().unwrap();
        sample_tree(src.path());
        let zips = tempdir().unwrap();
        let zip_path = zips.path().join("resource pack.zip");
        create_archive(src.path(), &zip_path).unwrap();

        let from_zip = tempdir().unwrap();
        assert!(merge_base_pack(Some(zip_path.as_path()), from_zip.path()).unwrap());
        assert!(from_zip.path().join("assets/bitterharvest/font/gui.json").is_file());

        let from_dir = tempdir().unwrap();
        assert!(merge_base_pack(Some(src.path()), from_dir.path()).unwrap());
        assert!(from_dir.path().join("pack.mcmeta").is_file());
    }

    #[test]
    fn missing_source_means_standalone() {
        let build = tempdir().unwrap();
        assert!(!merge_base_pack(None, build.path()).unwrap());
        let missing = build.path().join("nope.zip");
        assert!(!merge_base_pack(Some(missing.as_path()), build.path()).unwrap());
    }

    #[test]
    fn find_base_pack_returns_first_existing_candidate() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("resource pack.zip");
        fs::write(&present, b"").unwrap();

        let found = find_base_pack([dir.path().join("missing.zip"), present.clone()]).unwrap();

        assert_eq!(found, present.canonicalize().unwrap());
        assert!(find_base_pack([dir.path().join("missing.zip")]).is_none());
    }
}
