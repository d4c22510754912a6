use crate::engine::{EngineError, EngineHandle};
use facegif_core::SessionSnapshot;
use std::path::{Path, PathBuf};
use zbus::interface;

pub const BUS_NAME: &str = "org.facegif.Studio1";
pub const OBJECT_PATH: &str = "/org/facegif/Studio1";

/// D-Bus interface for the FaceGIF session daemon.
///
/// Bus name: org.facegif.Studio1
/// Object path: /org/facegif/Studio1
///
/// State-changing methods return the session snapshot as JSON.
pub struct StudioService {
    engine: EngineHandle,
    download_dir: PathBuf,
}

impl StudioService {
    pub fn new(engine: EngineHandle, download_dir: PathBuf) -> Self {
        Self {
            engine,
            download_dir,
        }
    }
}

fn to_fdo(err: EngineError) -> zbus::fdo::Error {
    match err {
        EngineError::Intake(e) => zbus::fdo::Error::InvalidArgs(e.to_string()),
        other => zbus::fdo::Error::Failed(other.to_string()),
    }
}

fn to_json(snapshot: Result<SessionSnapshot, EngineError>) -> zbus::fdo::Result<String> {
    let snapshot = snapshot.map_err(to_fdo)?;
    serde_json::to_string(&snapshot).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
}

#[interface(name = "org.facegif.Studio1")]
impl StudioService {
    /// Upload the user's own photo.
    async fn upload_source(&self, path: &str) -> zbus::fdo::Result<String> {
        tracing::info!(path, "upload_source requested");
        to_json(self.engine.upload_source(Path::new(path)).await)
    }

    /// Upload a target photo, replacing any selected candidate.
    async fn upload_target(&self, path: &str) -> zbus::fdo::Result<String> {
        tracing::info!(path, "upload_target requested");
        to_json(self.engine.upload_target(Path::new(path)).await)
    }

    /// Search for target candidates. Returns once the search has settled.
    async fn search(&self, query: &str) -> zbus::fdo::Result<String> {
        tracing::info!(query, "search requested");
        to_json(self.engine.search(query).await)
    }

    /// Select a candidate from the current result set.
    async fn select(&self, id: &str) -> zbus::fdo::Result<String> {
        tracing::info!(id, "select requested");
        to_json(self.engine.select(id).await)
    }

    /// Run the swap. Returns once processing has completed or failed.
    async fn process(&self) -> zbus::fdo::Result<String> {
        tracing::info!("process requested");
        to_json(self.engine.process().await)
    }

    /// Save the result into `dir` (empty = configured download dir).
    /// Returns the written path.
    async fn download(&self, dir: &str) -> zbus::fdo::Result<String> {
        let dest = if dir.is_empty() {
            self.download_dir.clone()
        } else {
            PathBuf::from(dir)
        };
        tracing::info!(dir = %dest.display(), "download requested");
        let receipt = self.engine.download(&dest).await.map_err(to_fdo)?;
        Ok(receipt.path.display().to_string())
    }

    async fn reset(&self) -> zbus::fdo::Result<String> {
        tracing::info!("reset requested");
        to_json(self.engine.reset().await)
    }

    async fn dismiss_error(&self) -> zbus::fdo::Result<String> {
        to_json(self.engine.dismiss_error().await)
    }

    async fn toggle_theme(&self) -> zbus::fdo::Result<String> {
        to_json(self.engine.toggle_theme().await)
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let live_references = self.engine.live_references().await.map_err(to_fdo)?;
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "live_references": live_references,
            "download_dir": self.download_dir.display().to_string(),
            "session": self.engine.snapshot(),
        })
        .to_string())
    }
}
