//! Upload intake: read a local file offered as an image.

use facegif_core::{ImageFile, IntakeError};
use std::io::ErrorKind;
use std::path::Path;

/// Read `path` into an [`ImageFile`] named after its file name.
///
/// No size or format policy is applied; only missing, unreadable, or empty
/// files are refused.
pub async fn open(path: &Path) -> Result<ImageFile, IntakeError> {
    let shown = path.display().to_string();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => IntakeError::NotFound(shown.clone()),
        _ => IntakeError::Read {
            path: shown.clone(),
            reason: e.to_string(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| shown.clone());

    let file = ImageFile::from_bytes(name, bytes)?;
    tracing::debug!(
        path = %shown,
        format = file.mime_type(),
        bytes = file.len(),
        "upload accepted"
    );
    Ok(file)
}
