use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("{0} is empty")]
    Empty(String),
}

/// An image file accepted through an upload slot.
///
/// Bytes are shared and never mutated, so clones are cheap and any
/// reference derived from this file is byte-identical to the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
    /// Sniffed from content when the `image` crate knows the format.
    pub format: Option<ImageFormat>,
}

impl ImageFile {
    /// Accept any non-empty file. Content the `image` crate cannot decode
    /// (HEIC, SVG, ...) is still accepted; only its MIME type is guessed
    /// from the file name.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, IntakeError> {
        let name = name.into();
        if bytes.is_empty() {
            return Err(IntakeError::Empty(name));
        }
        let format = image::guess_format(&bytes).ok();
        Ok(Self {
            name,
            bytes: bytes.into(),
            format,
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format
            .as_ref().map(ImageFormat::to_mime_type)
            .or_else(|| mime_from_name(&self.name))
            .unwrap_or("application/octet-stream")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    if let Some(format) = ImageFormat::from_extension(&ext) {
        return Some(format.to_mime_type());
    }
    match ext.as_str() {
        "svg" | "svgz" => Some("image/svg+xml"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// A displayable reference to an image.
///
/// `Blob` references are owned by the session and must be revoked once;
/// `Remote` references point at assets the session never owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayRef {
    Blob(Uuid),
    Remote(String),
}

impl DisplayRef {
    pub fn is_owned(&self) -> bool {
        matches!(self, DisplayRef::Blob(_))
    }
}

impl fmt::Display for DisplayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayRef::Blob(id) => write!(f, "blob:{id}"),
            DisplayRef::Remote(url) => f.write_str(url),
        }
    }
}

/// An upload together with the display reference acquired for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file: ImageFile,
    pub display: DisplayRef,
}

/// One search-result item offered as a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCandidate {
    pub id: String,
    pub url: String,
    #[serde(alias = "title")]
    pub label: String,
}

/// The active target. The two sources are exclusive by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetSelection {
    #[default]
    None,
    Candidate(TargetCandidate),
    UploadedPhoto(UploadedImage),
}

impl TargetSelection {
    pub fn is_some(&self) -> bool {
        !matches!(self, TargetSelection::None)
    }

    pub fn candidate(&self) -> Option<&TargetCandidate> {
        match self {
            TargetSelection::Candidate(c) => Some(c),
            _ => None,
        }
    }

    pub fn uploaded_photo(&self) -> Option<&UploadedImage> {
        match self {
            TargetSelection::UploadedPhoto(p) => Some(p),
            _ => None,
        }
    }
}

/// Output of one successful processing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    pub reference: DisplayRef,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Derived workflow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Idle,
    ReadyToProcess,
    Processing,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Search,
    Process,
}

/// A recoverable failure surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}
