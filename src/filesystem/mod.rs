use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Represents errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// Wrapper for standard IO errors.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Error raised while walking a directory tree.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    /// Error for a path that has no parent directory to stage a write in.
    #[error("Path has no parent directory: {0}")]
    NoParent(PathBuf),
}

/// Options for removing files or directories, such as recursive removal.
pub struct RemoveOptions {
    /// If true, removes directories recursively.
    pub recursive: bool,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self { recursive: false }
    }
}

/// Creates a directory (and its parents) if it does not exist.
///
/// # Errors
///
/// Returns `FilesystemError` if the directory cannot be created.
pub fn create_if_not_exists<P: AsRef<Path>>(dir: P) -> Result<(), FilesystemError> {
    let path = dir.as_ref();
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Recursively copies the contents of `src` into `dst`, merging with whatever
/// `dst` already holds. Existing files are overwritten.
///
/// # Returns
///
/// The number of files copied.
pub fn copy_dir_recursive<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
) -> Result<usize, FilesystemError> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    let mut copied = 0;

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Removes a file or directory at the given path, with options.
///
/// Missing paths are not an error.
pub fn remove_if_exists<P: AsRef<Path>>(path: P, options: RemoveOptions) -> Result<(), FilesystemError> {
    let p = path.as_ref();
    if p.is_dir() {
        if options.recursive {
            fs::remove_dir_all(p)?;
        } else {
            fs::remove_dir(p)?;
        }
    } else if p.is_file() {
        fs::remove_file(p)?;
    }
    Ok(())
}

/// Replaces the contents of `path` with `content` in one step.
///
/// The content is written to a temporary file in the same directory and then
/// renamed over the target, so readers see either the old file or the new one.
/// If anything fails before the rename, the original file is left untouched.
///
/// An existing target keeps its permissions, and a symlinked target is
/// written through the link so the link itself survives.
pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<(), FilesystemError> {
    let path = path.as_ref();
    let (target, existing) = match fs::canonicalize(path) {
        Ok(resolved) => {
            let permissions = fs::metadata(&resolved)?.permissions();
            (resolved, Some(permissions))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => (path.to_path_buf(), None),
        Err(e) => return Err(e.into()),
    };
    let parent = match target.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(FilesystemError::NoParent(target.clone())),
    };

    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    staged.write_all(content)?;
    if let Some(permissions) = existing {
        staged.as_file().set_permissions(permissions)?;
    }
    staged.as_file().sync_all()?;
    staged.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// Expands a path that starts with `~` to the user's home directory.
///
/// Paths without a leading `~` are returned unchanged. `~user` forms and a
/// missing home directory yield the input as-is.
pub fn expand_home(path: &str) -> PathBuf {
    if !path.starts_with('~') {
        return PathBuf::from(path);
    }
    let home = match dirs::home_dir() {
        Some(h) => h,
        None => return PathBuf::from(path),
    };
    if path == "~" {
        return home;
    }
    if path.starts_with("~/") || path.starts_with("~\\") {
        return home.join(&path[2..]);
    }
    PathBuf::from(path)
}
