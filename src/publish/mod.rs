//! Getting a built pack onto a public URL.
//!
//! Two routes exist: anonymous file hosts (0x0.st with file.io as fallback)
//! and a GitHub release driven through the `gh` CLI.

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const DEFAULT_PRIMARY_HOST: &str = "https://0x0.st";
pub const DEFAULT_FALLBACK_HOST: &str = "https://file.io/";
/// How long file.io keeps an upload.
pub const FILEIO_EXPIRY: &str = "14d";
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);
/// Release tag the GitHub route overwrites on every publish.
pub const RELEASE_TAG: &str = "latest";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{host} upload failed: HTTP {status} {body}")]
    Status { host: String, status: StatusCode, body: String },
    #[error("{host} upload failed: {message}")]
    Rejected { host: String, message: String },
    #[error("all upload hosts failed")]
    AllHostsFailed,
    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("could not determine the release download URL")]
    NoReleaseUrl,
    #[error("download failed: status code {0}")]
    Download(StatusCode),
    #[error("hash mismatch: got {got}, want {want}")]
    HashMismatch { got: String, want: String },
}

#[derive(Debug, Deserialize)]
struct FileIoResponse {
    #[serde(default)]
    success: bool,
    link: Option<String>,
    message: Option<String>,
}

/// Uploads packs to anonymous file hosts.
pub struct HostUploader {
    client: Client,
    pub primary: String,
    pub fallback: String,
}

impl HostUploader {
    pub fn new() -> Result<Self, PublishError> {
        Self::with_endpoints(DEFAULT_PRIMARY_HOST, DEFAULT_FALLBACK_HOST)
    }

    pub fn with_endpoints(primary: impl Into<String>, fallback: impl Into<String>) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            primary: primary.into(),
            fallback: fallback.into(),
        })
    }

    async fn zip_part(path: &Path) -> Result<Part, PublishError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pack.zip".to_string());
        Ok(Part::bytes(bytes).file_name(name).mime_str("application/zip")?)
    }

    /// Uploads to a 0x0.st-style host, whose response body is the URL.
    pub async fn upload_primary(&self, path: &Path) -> Result<String, PublishError> {
        info!(host = %self.primary, "uploading pack");
        let form = Form::new().part("file", Self::zip_part(path).await?);
        let response = self.client.post(&self.primary).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(PublishError::Status {
                host: self.primary.clone(),
                status,
                body: body.chars().take(200).collect(),
            });
        }

        let url = body.trim().to_string();
        if url.is_empty() {
            return Err(PublishError::Rejected {
                host: self.primary.clone(),
                message: "empty response".to_string(),
            });
        }
        Ok(url)
    }

    /// Uploads to a file.io-style host, which answers with JSON.
    pub async fn upload_fallback(&self, path: &Path) -> Result<String, PublishError> {
        info!(host = %self.fallback, "uploading pack");
        let form = Form::new()
            .part("file", Self::zip_part(path).await?)
            .text("expires", FILEIO_EXPIRY);
        let response = self.client.post(&self.fallback).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(PublishError::Status {
                host: self.fallback.clone(),
                status,
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: FileIoResponse = serde_json::from_str(&body).map_err(|e| PublishError::Rejected {
            host: self.fallback.clone(),
            message: format!("unreadable response: {e}"),
        })?;
        match (parsed.success, parsed.link) {
            (true, Some(link)) if !link.is_empty() => {
                warn!("file.io links expire after the first download or {FILEIO_EXPIRY}");
                Ok(link)
            }
            _ => Err(PublishError::Rejected {
                host: self.fallback.clone(),
                message: parsed.message.unwrap_or_else(|| "Unknown error".to_string()),
            }),
        }
    }

    /// Tries the primary host, then the fallback.
    pub async fn upload_auto(&self, path: &Path) -> Result<String, PublishError> {
        match self.upload_primary(path).await {
            Ok(url) => return Ok(url),
            Err(e) => warn!(error = %e, "primary host failed, trying backup host"),
        }
        match self.upload_fallback(path).await {
            Ok(url) => Ok(url),
            Err(e) => {
                warn!(error = %e, "backup host failed");
                warn!("upload the pack manually, then rerun with --url <URL>");
                Err(PublishError::AllHostsFailed)
            }
        }
    }
}

/// Publishes a pack as the single asset of the `latest` release of the git
/// repository at `repo_dir`, using the `gh` CLI.
pub struct GithubRelease {
    pub repo_dir: PathBuf,
}

impl GithubRelease {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self { repo_dir: repo_dir.into() }
    }

    async fn run(&self, program: &str, args: &[&str]) -> io::Result<Output> {
        debug!(program, ?args, "running");
        Command::new(program)
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await
    }

    /// Replaces the `latest` release with one holding `zip`, then commits the
    /// pack to the repository. Returns the asset's download URL.
    pub async fn publish(&self, zip: &Path, sha1: &str) -> Result<String, PublishError> {
        if !self.repo_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("resource pack repo not found: {}", self.repo_dir.display()),
            )
            .into());
        }
        info!(repo = %self.repo_dir.display(), "publishing to GitHub Releases");

        let zip_abs = zip.canonicalize()?.to_string_lossy().into_owned();
        let zip_name = zip
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Missing release is fine.
        let _ = self.run("gh", &["release", "delete", RELEASE_TAG, "--yes"]).await?;

        let notes = release_notes(sha1);
        let created = self
            .run(
                "gh",
                &[
                    "release", "create", RELEASE_TAG, zip_abs.as_str(),
                    "--title", "Latest Resource Pack",
                    "--notes", notes.as_str(),
                ],
            )
            .await?;
        if !created.status.success() {
            return Err(PublishError::Command {
                command: "gh release create".to_string(),
                stderr: String::from_utf8_lossy(&created.stderr).trim().to_string(),
            });
        }

        let url = self.asset_url(&zip_name).await?;
        info!(url = %url, "published to GitHub");

        self.commit_pack(&zip_name, sha1).await;
        Ok(url)
    }

    async fn asset_url(&self, zip_name: &str) -> Result<String, PublishError> {
        let view = self
            .run("gh", &["release", "view", RELEASE_TAG, "--json", "assets", "--jq", ".assets[0].url"])
            .await?;
        let url = String::from_utf8_lossy(&view.stdout).trim().to_string();
        if !url.is_empty() {
            return Ok(url);
        }

        let repo = self
            .run("gh", &["repo", "view", "--json", "nameWithOwner", "--jq", ".nameWithOwner"])
            .await?;
        let name_with_owner = String::from_utf8_lossy(&repo.stdout).trim().to_string();
        if name_with_owner.is_empty() {
            return Err(PublishError::NoReleaseUrl);
        }
        Ok(release_download_url(&name_with_owner, zip_name))
    }

    /// Best effort: a failed commit or push does not undo the release.
    async fn commit_pack(&self, zip_name: &str, sha1: &str) {
        let message = commit_message(sha1);
        let steps: [&[&str]; 3] = [&["add", zip_name], &["commit", "-m", message.as_str()], &["push"]];
        for args in steps {
            match self.run("git", args).await {
                Ok(out) if out.status.success() => {}
                Ok(out) => {
                    warn!(?args, stderr = %String::from_utf8_lossy(&out.stderr).trim(), "git step failed");
                    return;
                }
                Err(e) => {
                    warn!(?args, error = %e, "could not run git");
                    return;
                }
            }
        }
    }
}

pub fn release_download_url(name_with_owner: &str, zip_name: &str) -> String {
    format!("https://github.com/{name_with_owner}/releases/download/{RELEASE_TAG}/{zip_name}")
}

pub fn release_notes(sha1: &str) -> String {
    format!("Auto-generated resource pack.\n\n**SHA-1:** `{sha1}`")
}

pub fn commit_message(sha1: &str) -> String {
    let short = sha1.get(..8).unwrap_or(sha1);
    format!("Update resource pack ({short})")
}

/// Downloads `url` and checks that its SHA-1 matches `expected`.
///
/// The body is streamed through the hasher and never written to disk.
pub async fn verify_remote(url: &str, expected: &str) -> Result<(), PublishError> {
    let client = Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(PublishError::Download(response.status()));
    }

    let mut hasher = Sha1::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        hasher.update(&chunk?);
    }

    let actual = hex::encode(hasher.finalize().to_vec());
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(PublishError::HashMismatch {
            got: actual,
            want: expected.to_string(),
        });
    }
    info!(url, "published pack matches local SHA-1");
    Ok(())
}
