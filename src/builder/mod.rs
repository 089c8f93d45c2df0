use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::archive::{self, ArchiveError};
use crate::backgrounds::{self, BackgroundError, BackgroundMeta};
use crate::font::{self, FontError};
use crate::mcmeta::{self, Mcmeta, McmetaError};

/// Namespace the pack's own assets live under.
pub const DEFAULT_NAMESPACE: &str = "bitterharvest";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to create build directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to stat archive: {0}")]
    Stat(#[source] std::io::Error),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Background(#[from] BackgroundError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error(transparent)]
    Mcmeta(#[from] McmetaError),
}

/// Inputs for one pack build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Pack to merge underneath ours (`.zip` or directory). `None` builds a
    /// standalone pack.
    pub base_pack: Option<PathBuf>,
    pub output: PathBuf,
    /// Folder with custom `<background>.png` files.
    pub art_dir: Option<PathBuf>,
    pub namespace: String,
    pub mcmeta: Mcmeta,
}

impl BuildOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            base_pack: None,
            output: output.into(),
            art_dir: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            mcmeta: Mcmeta::new(mcmeta::DEFAULT_PACK_FORMAT, mcmeta::DEFAULT_DESCRIPTION),
        }
    }
}

/// What a finished build produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub archive: PathBuf,
    /// Lowercase hex SHA-1 of the archive.
    pub sha1: String,
    pub size_bytes: u64,
    pub merged: bool,
    pub backgrounds: Vec<BackgroundMeta>,
}

/// Assembles the pack in a temporary directory and zips it to
/// `options.output`. The temporary directory is removed however the build ends.
pub fn build_pack(options: &BuildOptions) -> Result<BuildOutcome, BuildError> {
    let workdir = tempfile::Builder::new()
        .prefix("pack-build-")
        .tempdir()
        .map_err(BuildError::TempDir)?;
    let build_dir = workdir.path();

    info!("[1/5] preparing base pack");
    let merged = archive::merge_base_pack(options.base_pack.as_deref(), build_dir)?;
    if merged {
        log_base_mcmeta(build_dir);
    }

    info!("[2/5] writing background images");
    let art_dir = options.art_dir.as_deref().and_then(backgrounds::usable_art_dir);
    let written = backgrounds::write_backgrounds(build_dir, &options.namespace, art_dir)?;

    info!("[3/5] creating font configuration");
    font::write_font(build_dir, &options.namespace, &written)?;

    info!("[4/5] creating pack metadata");
    mcmeta::write_pack_mcmeta(build_dir, &options.mcmeta)?;

    info!("[5/5] creating final pack");
    let sha1 = archive::create_archive(build_dir, &options.output)?;
    let size_bytes = fs::metadata(&options.output).map_err(BuildError::Stat)?.len();
    info!(
        archive = %options.output.display(),
        size_mb = %format!("{:.2}", size_bytes as f64 / (1024.0 * 1024.0)),
        sha1 = %sha1,
        "created pack"
    );

    Ok(BuildOutcome {
        archive: options.output.clone(),
        sha1,
        size_bytes,
        merged,
        backgrounds: written,
    })
}

fn log_base_mcmeta(build_dir: &Path) {
    let path = build_dir.join("pack.mcmeta");
    if !path.is_file() {
        return;
    }
    match mcmeta::parse_resource_pack_mcmeta(&path) {
        Ok(base) => info!(
            pack_format = base.pack.pack_format,
            description = %base.pack.description,
            "replacing base pack metadata"
        ),
        Err(e) => debug!(error = %e, "base pack metadata unreadable"),
    }
}
