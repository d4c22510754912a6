//! Result export: save the result reference to disk unchanged.

use facegif_core::{BlobStore, DisplayRef, ImageFile};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("reference {0} is no longer available")]
    Revoked(String),
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to write {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Bytes to export, resolved while the store is still at hand.
#[derive(Debug, Clone)]
pub enum ExportSource {
    Local(ImageFile),
    Remote(String),
}

impl ExportSource {
    pub fn resolve(reference: &DisplayRef, store: &BlobStore) -> Result<Self, ExportError> {
        match reference {
            DisplayRef::Blob(_) => store
                .resolve(reference)
                .cloned()
                .map(ExportSource::Local)
                .ok_or_else(|| ExportError::Revoked(reference.to_string())),
            DisplayRef::Remote(url) => Ok(ExportSource::Remote(url.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub path: PathBuf,
    pub size: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct Exporter {
    client: reqwest::Client,
}

impl Exporter {
    pub fn new() -> Result<Self, ExportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Write the source to `path` byte-for-byte. No format conversion.
    pub async fn export(&self, source: ExportSource, path: &Path) -> Result<ExportReceipt, ExportError> {
        let bytes: Arc<[u8]> = match source {
            ExportSource::Local(file) => file.bytes,
            ExportSource::Remote(url) => {
                tracing::debug!(url = %url, "fetching remote result");
                let body = self
                    .client
                    .get(url.as_str())
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
                Arc::from(body.as_ref())
            }
        };

        let write_err = |e: std::io::Error| ExportError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(path, &bytes[..]).await.map_err(write_err)?;

        let sha256 = format!("{:x}", Sha256::digest(&bytes[..]));
        tracing::info!(path = %path.display(), size = bytes.len(), sha256 = %sha256, "result exported");
        Ok(ExportReceipt {
            path: path.to_path_buf(),
            size: bytes.len(),
            sha256,
        })
    }
}
