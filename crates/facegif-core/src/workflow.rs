//! Session workflow reducer.
//!
//! `Session::update` is the only way state changes. It performs no I/O and
//! returns the effects the caller must run: collaborator calls, reference
//! releases, and exports. Completions come back as actions tagged with the
//! request id they answer; anything not matching the pending id is stale.

use crate::search::SearchError;
use crate::swap::{SwapError, SwapJob, SwapTarget};
use crate::types::{
    DisplayRef, ErrorKind, Phase, ProcessingResult, SessionError, TargetCandidate,
    TargetSelection, Theme, UploadedImage,
};
use std::path::PathBuf;

/// Default filename for a downloaded result.
pub const RESULT_FILE_NAME: &str = "face-swap-result.jpg";

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    UploadSource(UploadedImage),
    UploadTarget(UploadedImage),
    Search(String),
    SearchFinished {
        request_id: RequestId,
        outcome: Result<Vec<TargetCandidate>, SearchError>,
    },
    SelectCandidate(String),
    Process,
    ProcessFinished {
        request_id: RequestId,
        outcome: Result<ProcessingResult, SwapError>,
    },
    Download { dest_dir: PathBuf },
    Reset,
    DismissError,
    ToggleTheme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Search { request_id: RequestId, query: String },
    Process { request_id: RequestId, job: SwapJob },
    Release(DisplayRef),
    Export { reference: DisplayRef, path: PathBuf },
}

/// Everything a session holds between actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub source: Option<UploadedImage>,
    pub target: TargetSelection,
    pub candidates: Vec<TargetCandidate>,
    pub query: String,
    pub result: Option<ProcessingResult>,
    pub is_searching: bool,
    pub is_processing: bool,
    pub last_error: Option<SessionError>,
    pending_search: Option<RequestId>,
    pending_process: Option<RequestId>,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if self.is_processing {
            Phase::Processing
        } else if self.result.is_some() {
            Phase::Completed
        } else if self.source.is_some() && self.target.is_some() {
            Phase::ReadyToProcess
        } else {
            Phase::Idle
        }
    }

    pub fn can_process(&self) -> bool {
        self.source.is_some() && self.target.is_some() && !self.is_processing
    }

    /// Owned display references currently held by this state.
    pub fn owned_refs(&self) -> Vec<DisplayRef> {
        let source = self.source.as_ref().map(|s| &s.display);
        let target = self.target.uploaded_photo().map(|t| &t.display);
        let result = self.result.as_ref().map(|r| &r.reference);
        [source, target, result]
            .into_iter()
            .flatten()
            .filter(|r| r.is_owned())
            .cloned()
            .collect()
    }
}

/// A session: workflow state plus preferences that survive reset.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    theme: Theme,
    next_request_id: RequestId,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    fn allocate_request(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }

    pub fn update(&mut self, action: Action) -> Vec<Effect> {
        let mut effects = Vec::new();
        match action {
            Action::UploadSource(upload) => {
                tracing::info!(name = %upload.file.name, "source photo uploaded");
                if let Some(old) = self.state.source.replace(upload) {
                    release(&mut effects, old.display);
                }
            }
            Action::UploadTarget(upload) => {
                tracing::info!(name = %upload.file.name, "target photo uploaded");
                let old = std::mem::replace(&mut self.state.target, TargetSelection::UploadedPhoto(upload));
                release_selection(&mut effects, old);
            }
            Action::Search(query) => {
                let trimmed = query.trim();
                if trimmed.is_empty() {
                    tracing::debug!("blank search query ignored");
                    return effects;
                }
                let request_id = self.allocate_request();
                tracing::info!(request_id, query = trimmed, "search issued");
                let trimmed = trimmed.to_string();
                self.state.query = query;
                self.state.is_searching = true;
                self.state.pending_search = Some(request_id);
                effects.push(Effect::Search {
                    request_id,
                    query: trimmed,
                });
            }
            Action::SearchFinished {
                request_id,
                outcome,
            } => {
                if self.state.pending_search != Some(request_id) {
                    tracing::debug!(request_id, "stale search response discarded");
                    return effects;
                }
                self.state.pending_search = None;
                self.state.is_searching = false;
                match outcome {
                    Ok(candidates) => {
                        tracing::info!(request_id, count = candidates.len(), "search completed");
                        self.state.candidates = candidates;
                    }
                    Err(err) => {
                        tracing::warn!(request_id, error = %err, "search failed");
                        self.state.last_error = Some(SessionError {
                            kind: ErrorKind::Search,
                            message: err.to_string(),
                        });
                    }
                }
            }
            Action::SelectCandidate(id) => {
                let Some(candidate) = self.state.candidates.iter().find(|c| c.id == id).cloned() else {
                    tracing::debug!(id = %id, "select of unknown candidate ignored");
                    return effects;
                };
                tracing::info!(id = %id, label = %candidate.label, "candidate selected");
                let old = std::mem::replace(&mut self.state.target, TargetSelection::Candidate(candidate));
                release_selection(&mut effects, old);
            }
            Action::Process => {
                if !self.state.can_process() {
                    tracing::debug!("process ignored: preconditions not met");
                    return effects;
                }
                let Some(source) = self.state.source.as_ref() else {
                    return effects;
                };
                let target = match &self.state.target {
                    TargetSelection::Candidate(c) => SwapTarget::Candidate(c.clone()),
                    TargetSelection::UploadedPhoto(p) => SwapTarget::Photo(p.file.clone()),
                    TargetSelection::None => return effects,
                };
                let job = SwapJob::new(source, target);
                let request_id = self.allocate_request();
                tracing::info!(request_id, "processing started");
                self.state.is_processing = true;
                self.state.pending_process = Some(request_id);
                self.state.last_error = None;
                effects.push(Effect::Process { request_id, job });
            }
            Action::ProcessFinished {
                request_id,
                outcome,
            } => {
                if self.state.pending_process != Some(request_id) {
                    tracing::debug!(request_id, "stale processing response discarded");
                    if let Ok(result) = outcome {
                        release(&mut effects, result.reference);
                    }
                    return effects;
                }
                self.state.pending_process = None;
                self.state.is_processing = false;
                match outcome {
                    Ok(result) => {
                        tracing::info!(request_id, reference = %result.reference, "processing completed");
                        if let Some(old) = self.state.result.replace(result) {
                            release(&mut effects, old.reference);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(request_id, error = %err, "processing failed");
                        self.state.last_error = Some(SessionError {
                            kind: ErrorKind::Process,
                            message: err.to_string(),
                        });
                    }
                }
            }
            Action::Download { dest_dir } => {
                if let Some(result) = &self.state.result {
                    effects.push(Effect::Export {
                        reference: result.reference.clone(),
                        path: dest_dir.join(RESULT_FILE_NAME),
                    });
                }
            }
            Action::Reset => {
                let old = std::mem::take(&mut self.state);
                tracing::info!(phase = ?old.phase(), "session reset");
                for reference in old.owned_refs() {
                    effects.push(Effect::Release(reference));
                }
            }
            Action::DismissError => {
                self.state.last_error = None;
            }
            Action::ToggleTheme => {
                self.theme = self.theme.toggled();
            }
        }
        effects
    }
}

fn release(effects: &mut Vec<Effect>, reference: DisplayRef) {
    if reference.is_owned() {
        effects.push(Effect::Release(reference));
    }
}

fn release_selection(effects: &mut Vec<Effect>, old: TargetSelection) {
    if let TargetSelection::UploadedPhoto(photo) = old {
        release(effects, photo.display);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BlobStore;
    use crate::types::ImageFile;

    fn upload(store: &mut BlobStore, name: &str, tail: u8) -> UploadedImage {
        let file = ImageFile::from_bytes(name, vec![0xFF, 0xD8, 0xFF, tail]).unwrap();
        let display = store.create(file.clone());
        UploadedImage { file, display }
    }

    fn candidates() -> Vec<TargetCandidate> {
        ["Happy Person", "Smiling Face", "Portrait"]
            .iter()
            .enumerate()
            .map(|(i, label)| TargetCandidate {
                id: (i + 1).to_string(),
                url: format!("https://example.com/{}.jpg", i + 1),
                label: label.to_string(),
            })
            .collect()
    }

    /// Apply effects the way the engine would, for release accounting.
    fn run(session: &mut Session, store: &mut BlobStore, action: Action) -> Vec<Effect> {
        let effects = session.update(action);
        for effect in &effects {
            if let Effect::Release(r) = effect {
                assert!(store.revoke(r), "double release of {r}");
            }
        }
        effects
    }

    fn search(session: &mut Session, query: &str) -> RequestId {
        match session.update(Action::Search(query.into())).as_slice() {
            [Effect::Search { request_id, .. }] => *request_id,
            other => panic!("expected one search effect, got {other:?}"),
        }
    }

    fn finish_search(session: &mut Session, request_id: RequestId) {
        session.update(Action::SearchFinished {
            request_id,
            outcome: Ok(candidates()),
        });
    }

    fn completed(reference: DisplayRef) -> ProcessingResult {
        ProcessingResult {
            reference,
            completed_at: chrono::Utc::now(),
        }
    }

    fn exclusive(state: &SessionState) -> bool {
        // A sum type cannot hold both, but check the accessors agree.
        !(state.target.candidate().is_some() && state.target.uploaded_photo().is_some())
    }

    #[test]
    fn test_initial_state_is_idle() {
        let session = Session::new();
        assert_eq!(session.state().phase(), Phase::Idle);
        assert!(!session.state().can_process());
        assert_eq!(session.theme(), Theme::Dark);
    }

    #[test]
    fn test_upload_source_releases_previous() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let a = upload(&mut store, "A.jpg", 1);
        let b = upload(&mut store, "A2.jpg", 2);
        let first = a.display.clone();

        assert!(run(&mut session, &mut store, Action::UploadSource(a)).is_empty());
        let effects = run(&mut session, &mut store, Action::UploadSource(b));
        assert_eq!(effects, vec![Effect::Release(first)]);
        assert_eq!(session.state().source.as_ref().unwrap().file.name, "A2.jpg");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upload_source_keeps_target() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let t = upload(&mut store, "B.jpg", 2);
        run(&mut session, &mut store, Action::UploadTarget(t.clone()));
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        assert_eq!(session.state().target, TargetSelection::UploadedPhoto(t));
    }

    #[test]
    fn test_mutual_exclusivity_over_action_sequences() {
        // Every sequence of 4 steps mixing select / upload-target.
        for mask in 0u8..16 {
            let mut store = BlobStore::new();
            let mut session = Session::new();
            let id = search(&mut session, "cat");
            finish_search(&mut session, id);

            for step in 0..4 {
                if mask & (1 << step) == 0 {
                    let pick = (step % 3 + 1).to_string();
                    run(&mut session, &mut store, Action::SelectCandidate(pick.clone()));
                    assert_eq!(session.state().target.candidate().map(|c| c.id.clone()), Some(pick));
                    assert!(session.state().target.uploaded_photo().is_none());
                } else {
                    let t = upload(&mut store, "B.jpg", step);
                    run(&mut session, &mut store, Action::UploadTarget(t));
                    assert!(session.state().target.candidate().is_none());
                    assert!(session.state().target.uploaded_photo().is_some());
                }
                assert!(exclusive(session.state()));
                // Only the currently displayed target photo is live.
                assert_eq!(store.len(), session.state().owned_refs().len());
            }
        }
    }

    #[test]
    fn test_upload_then_select_clears_photo() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);

        let t = upload(&mut store, "B.jpg", 2);
        let t_ref = t.display.clone();
        run(&mut session, &mut store, Action::UploadTarget(t));
        let effects = run(&mut session, &mut store, Action::SelectCandidate("2".into()));

        assert_eq!(effects, vec![Effect::Release(t_ref)]);
        assert_eq!(session.state().target.candidate().unwrap().label, "Smiling Face");
        assert!(store.is_empty());
    }

    #[test]
    fn test_select_then_upload_clears_candidate() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);

        run(&mut session, &mut store, Action::SelectCandidate("1".into()));
        let t = upload(&mut store, "B.jpg", 2);
        let effects = run(&mut session, &mut store, Action::UploadTarget(t.clone()));

        assert!(effects.is_empty());
        assert_eq!(session.state().target, TargetSelection::UploadedPhoto(t));
    }

    #[test]
    fn test_select_unknown_candidate_is_noop() {
        let mut session = Session::new();
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);
        let before = session.state().clone();
        assert!(session.update(Action::SelectCandidate("99".into())).is_empty());
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_blank_search_is_noop() {
        let mut session = Session::new();
        for q in ["", "   ", "\t\n"] {
            assert!(session.update(Action::Search(q.into())).is_empty());
        }
        assert!(!session.state().is_searching);
        assert!(session.state().candidates.is_empty());
        assert_eq!(session.state().query, "");
    }

    #[test]
    fn test_search_trims_query_for_provider() {
        let mut session = Session::new();
        let effects = session.update(Action::Search("  cat ".into()));
        assert!(matches!(&effects[..], [Effect::Search { query, .. }] if query == "cat"));
        assert_eq!(session.state().query, "  cat ");
        assert!(session.state().is_searching);
    }

    #[test]
    fn test_search_success_replaces_candidates() {
        let mut session = Session::new();
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);
        assert_eq!(session.state().candidates.len(), 3);
        assert!(!session.state().is_searching);

        let id = search(&mut session, "nothing");
        session.update(Action::SearchFinished {
            request_id: id,
            outcome: Ok(vec![]),
        });
        assert!(session.state().candidates.is_empty());
    }

    #[test]
    fn test_search_failure_keeps_candidates() {
        let mut session = Session::new();
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);

        let id = search(&mut session, "dog");
        session.update(Action::SearchFinished {
            request_id: id,
            outcome: Err(SearchError::Unavailable("offline".into())),
        });

        let state = session.state();
        assert_eq!(state.candidates, candidates());
        assert!(!state.is_searching);
        assert_eq!(state.last_error.as_ref().unwrap().kind, ErrorKind::Search);

        session.update(Action::DismissError);
        assert!(session.state().last_error.is_none());
    }

    #[test]
    fn test_stale_search_response_is_discarded() {
        let mut session = Session::new();
        let first = search(&mut session, "cat");
        let second = search(&mut session, "dog");

        session.update(Action::SearchFinished {
            request_id: first,
            outcome: Ok(candidates()),
        });
        assert!(session.state().candidates.is_empty());
        assert!(session.state().is_searching);

        session.update(Action::SearchFinished {
            request_id: second,
            outcome: Ok(candidates()[..1].to_vec()),
        });
        assert_eq!(session.state().candidates.len(), 1);
        assert!(!session.state().is_searching);
    }

    #[test]
    fn test_process_enabled_iff_source_and_target() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        assert!(!session.state().can_process());

        let u = upload(&mut store, "A.jpg", 1);

        run(&mut session, &mut store, Action::UploadSource(u));
        assert!(!session.state().can_process());

        let u = upload(&mut store, "B.jpg", 2);

        run(&mut session, &mut store, Action::UploadTarget(u));
        assert!(session.state().can_process());
        assert_eq!(session.state().phase(), Phase::ReadyToProcess);

        run(&mut session, &mut store, Action::Process);
        assert!(!session.state().can_process());
        assert_eq!(session.state().phase(), Phase::Processing);
        assert!(run(&mut session, &mut store, Action::Process).is_empty());
    }

    #[test]
    fn test_process_without_source_is_noop() {
        let mut session = Session::new();
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);
        session.update(Action::SelectCandidate("1".into()));
        let before = session.state().clone();

        assert!(session.update(Action::Process).is_empty());
        assert_eq!(session.state(), &before);
        assert_eq!(session.state().phase(), Phase::Idle);
    }

    #[test]
    fn test_candidate_scenario_completes_with_candidate_url() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);
        run(&mut session, &mut store, Action::SelectCandidate("2".into()));

        let effects = run(&mut session, &mut store, Action::Process);
        let [Effect::Process { request_id, job }] = effects.as_slice() else {
            panic!("expected process effect, got {effects:?}");
        };
        assert_eq!(job.source.name, "A.jpg");
        assert!(matches!(&job.target, SwapTarget::Candidate(c) if c.id == "2"));

        let reference = DisplayRef::Remote("https://example.com/2.jpg".into());
        run(
            &mut session,
            &mut store,
            Action::ProcessFinished {
                request_id: *request_id,
                outcome: Ok(completed(reference.clone())),
            },
        );
        let state = session.state();
        assert_eq!(state.phase(), Phase::Completed);
        assert_eq!(state.result.as_ref().unwrap().reference, reference);
        assert!(!state.is_processing);
    }

    #[test]
    fn test_process_failure_returns_to_ready() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        let u = upload(&mut store, "B.jpg", 2);
        run(&mut session, &mut store, Action::UploadTarget(u));
        let effects = run(&mut session, &mut store, Action::Process);
        let [Effect::Process { request_id, .. }] = effects.as_slice() else {
            panic!("expected process effect");
        };

        run(
            &mut session,
            &mut store,
            Action::ProcessFinished {
                request_id: *request_id,
                outcome: Err(SwapError::Timeout(std::time::Duration::from_secs(30))),
            },
        );
        let state = session.state();
        assert_eq!(state.phase(), Phase::ReadyToProcess);
        assert!(state.source.is_some() && state.target.is_some());
        assert_eq!(state.last_error.as_ref().unwrap().kind, ErrorKind::Process);
        assert!(state.result.is_none());

        // Retrying clears the surfaced error.
        run(&mut session, &mut store, Action::Process);
        assert!(session.state().last_error.is_none());
    }

    #[test]
    fn test_rerun_releases_previous_result() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let target = upload(&mut store, "B.jpg", 2);
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        run(&mut session, &mut store, Action::UploadTarget(target.clone()));

        for _ in 0..2 {
            let effects = run(&mut session, &mut store, Action::Process);
            let [Effect::Process { request_id, .. }] = effects.as_slice() else {
                panic!("expected process effect");
            };
            let reference = store.create(target.file.clone());
            run(
                &mut session,
                &mut store,
                Action::ProcessFinished {
                    request_id: *request_id,
                    outcome: Ok(completed(reference)),
                },
            );
        }
        // source + target + latest result
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_reset_after_completed_restores_initial_state() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);
        let target = upload(&mut store, "B.jpg", 2);
        run(&mut session, &mut store, Action::UploadTarget(target.clone()));
        let effects = run(&mut session, &mut store, Action::Process);
        let [Effect::Process { request_id, .. }] = effects.as_slice() else {
            panic!("expected process effect");
        };
        let reference = store.create(target.file);
        run(
            &mut session,
            &mut store,
            Action::ProcessFinished {
                request_id: *request_id,
                outcome: Ok(completed(reference)),
            },
        );
        session.update(Action::ToggleTheme);
        assert_eq!(session.state().phase(), Phase::Completed);

        let effects = run(&mut session, &mut store, Action::Reset);
        assert_eq!(effects.len(), 3);
        assert_eq!(session.state(), &SessionState::default());
        assert_eq!(session.state().phase(), Phase::Idle);
        assert!(store.is_empty());
        // Preferences survive reset.
        assert_eq!(session.theme(), Theme::Light);
    }

    #[test]
    fn test_reset_from_any_state_yields_initial() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        assert!(run(&mut session, &mut store, Action::Reset).is_empty());
        assert_eq!(session.state(), &SessionState::default());

        search(&mut session, "cat");
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        run(&mut session, &mut store, Action::Reset);
        assert_eq!(session.state(), &SessionState::default());
        assert!(store.is_empty());
    }

    #[test]
    fn test_completion_after_reset_is_discarded_and_released() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let target = upload(&mut store, "B.jpg", 2);
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        run(&mut session, &mut store, Action::UploadTarget(target.clone()));
        let effects = run(&mut session, &mut store, Action::Process);
        let [Effect::Process { request_id, .. }] = effects.as_slice() else {
            panic!("expected process effect");
        };
        let request_id = *request_id;
        run(&mut session, &mut store, Action::Reset);

        let late = store.create(target.file);
        let effects = run(
            &mut session,
            &mut store,
            Action::ProcessFinished {
                request_id,
                outcome: Ok(completed(late.clone())),
            },
        );
        assert_eq!(effects, vec![Effect::Release(late)]);
        assert_eq!(session.state(), &SessionState::default());
        assert!(store.is_empty());
    }

    #[test]
    fn test_search_answer_after_reset_is_discarded() {
        let mut session = Session::new();
        let request_id = search(&mut session, "cat");
        session.update(Action::Reset);

        let effects = session.update(Action::SearchFinished {
            request_id,
            outcome: Ok(candidates()),
        });
        assert!(effects.is_empty());
        assert_eq!(session.state(), &SessionState::default());
    }

    #[test]
    fn test_failed_rerun_keeps_previous_result() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let target = upload(&mut store, "B.jpg", 2);
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        run(&mut session, &mut store, Action::UploadTarget(target.clone()));

        let effects = run(&mut session, &mut store, Action::Process);
        let [Effect::Process { request_id, .. }] = effects.as_slice() else {
            panic!("expected process effect");
        };
        let first = store.create(target.file.clone());
        run(
            &mut session,
            &mut store,
            Action::ProcessFinished {
                request_id: *request_id,
                outcome: Ok(completed(first.clone())),
            },
        );

        let effects = run(&mut session, &mut store, Action::Process);
        let [Effect::Process { request_id, .. }] = effects.as_slice() else {
            panic!("expected process effect");
        };
        let effects = run(
            &mut session,
            &mut store,
            Action::ProcessFinished {
                request_id: *request_id,
                outcome: Err(SwapError::Failed("model crashed".into())),
            },
        );
        assert!(effects.is_empty());
        let state = session.state();
        assert_eq!(state.phase(), Phase::Completed);
        assert_eq!(state.result.as_ref().unwrap().reference, first);
        assert_eq!(state.last_error.as_ref().unwrap().kind, ErrorKind::Process);
        assert!(store.resolve(&first).is_some());
    }

    #[test]
    fn test_download_requires_result() {
        let mut session = Session::new();
        assert!(session
            .update(Action::Download { dest_dir: "/tmp".into() })
            .is_empty());
    }

    #[test]
    fn test_download_uses_fixed_filename() {
        let mut store = BlobStore::new();
        let mut session = Session::new();
        let u = upload(&mut store, "A.jpg", 1);
        run(&mut session, &mut store, Action::UploadSource(u));
        let id = search(&mut session, "cat");
        finish_search(&mut session, id);
        run(&mut session, &mut store, Action::SelectCandidate("3".into()));
        let effects = run(&mut session, &mut store, Action::Process);
        let [Effect::Process { request_id, .. }] = effects.as_slice() else {
            panic!("expected process effect");
        };
        let reference = DisplayRef::Remote("https://example.com/3.jpg".into());
        run(
            &mut session,
            &mut store,
            Action::ProcessFinished {
                request_id: *request_id,
                outcome: Ok(completed(reference.clone())),
            },
        );
        let before = session.state().clone();

        let effects = session.update(Action::Download { dest_dir: "/tmp/out".into() });
        assert_eq!(
            effects,
            vec![Effect::Export {
                reference,
                path: PathBuf::from("/tmp/out/face-swap-result.jpg"),
            }]
        );
        assert_eq!(session.state(), &before);
    }
}
