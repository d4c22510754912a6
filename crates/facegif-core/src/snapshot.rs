//! Serializable view of a session, as shown to front ends.

use crate::types::{Phase, SessionError, TargetCandidate, TargetSelection, Theme, UploadedImage};
use crate::workflow::Session;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub name: String,
    pub mime_type: String,
    pub size: usize,
    pub display: String,
}

impl From<&UploadedImage> for ImageSummary {
    fn from(upload: &UploadedImage) -> Self {
        Self {
            name: upload.file.name.clone(),
            mime_type: upload.file.mime_type().to_string(),
            size: upload.file.len(),
            display: upload.display.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetSummary {
    None,
    Candidate(TargetCandidate),
    Photo(ImageSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub reference: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub can_process: bool,
    pub source: Option<ImageSummary>,
    pub target: TargetSummary,
    pub query: String,
    pub candidates: Vec<TargetCandidate>,
    pub is_searching: bool,
    pub is_processing: bool,
    pub result: Option<ResultSummary>,
    pub last_error: Option<SessionError>,
    pub theme: Theme,
}

impl SessionSnapshot {
    pub fn of(session: &Session) -> Self {
        let state = session.state();
        Self {
            phase: state.phase(),
            can_process: state.can_process(),
            source: state.source.as_ref().map(ImageSummary::from),
            target: match &state.target {
                TargetSelection::None => TargetSummary::None,
                TargetSelection::Candidate(c) => TargetSummary::Candidate(c.clone()),
                TargetSelection::UploadedPhoto(p) => TargetSummary::Photo(p.into()),
            },
            query: state.query.clone(),
            candidates: state.candidates.clone(),
            is_searching: state.is_searching,
            is_processing: state.is_processing,
            result: state.result.as_ref().map(|r| ResultSummary {
                reference: r.reference.to_string(),
                completed_at: r.completed_at,
            }),
            last_error: state.last_error.clone(),
            theme: session.theme(),
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::of(&Session::new())
    }
}
