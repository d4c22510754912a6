use facegif_core::{
    Action, BlobStore, DisplayRef, Effect, ImageFile, IntakeError, ProcessingResult, RequestId,
    SearchError, Session, SessionSnapshot, SwapError, SwapJob, SwapOutput, SwapProcessor,
    TargetCandidate, TargetSearch, UploadedImage,
};
use facegif_media::{intake, ExportError, ExportReceipt, ExportSource, Exporter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("upload rejected: {0}")]
    Intake(#[from] IntakeError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("nothing to download: no result yet")]
    NoResult,
    #[error("engine task exited")]
    ChannelClosed,
}

/// Bounds on collaborator calls.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub search: Duration,
    pub process: Duration,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Source,
    Target,
}

/// Messages sent from D-Bus handlers to the engine task.
enum EngineRequest {
    Upload {
        slot: Slot,
        file: ImageFile,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Dispatch {
        action: Action,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Download {
        dest_dir: PathBuf,
        reply: ExportReply,
    },
    LiveReferences {
        reply: oneshot::Sender<usize>,
    },
}

type ExportReply = oneshot::Sender<Result<ExportReceipt, EngineError>>;

/// Collaborator answers coming back from spawned tasks.
enum Completion {
    Search {
        request_id: RequestId,
        outcome: Result<Vec<TargetCandidate>, SearchError>,
    },
    Process {
        request_id: RequestId,
        outcome: Result<SwapOutput, SwapError>,
    },
}

/// Clone-safe handle to the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl EngineHandle {
    /// Read and validate `path`, then install it as the source photo.
    pub async fn upload_source(&self, path: &Path) -> Result<SessionSnapshot, EngineError> {
        let file = intake::open(path).await?;
        self.upload(Slot::Source, file).await
    }

    /// Read and validate `path`, then install it as the target photo.
    pub async fn upload_target(&self, path: &Path) -> Result<SessionSnapshot, EngineError> {
        let file = intake::open(path).await?;
        self.upload(Slot::Target, file).await
    }

    async fn upload(&self, slot: Slot, file: ImageFile) -> Result<SessionSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Upload { slot, file, reply })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    async fn dispatch(&self, action: Action) -> Result<SessionSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Dispatch { action, reply })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Issue a search and wait until no search is in flight.
    pub async fn search(&self, query: &str) -> Result<SessionSnapshot, EngineError> {
        self.dispatch(Action::Search(query.to_string())).await?;
        self.settled(|s| !s.is_searching).await
    }

    pub async fn select(&self, id: &str) -> Result<SessionSnapshot, EngineError> {
        self.dispatch(Action::SelectCandidate(id.to_string())).await
    }

    /// Start processing and wait until it completes or fails.
    pub async fn process(&self) -> Result<SessionSnapshot, EngineError> {
        self.dispatch(Action::Process).await?;
        self.settled(|s| !s.is_processing).await
    }

    pub async fn download(&self, dest_dir: &Path) -> Result<ExportReceipt, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Download {
                dest_dir: dest_dir.to_path_buf(),
                reply,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    pub async fn reset(&self) -> Result<SessionSnapshot, EngineError> {
        self.dispatch(Action::Reset).await
    }

    pub async fn dismiss_error(&self) -> Result<SessionSnapshot, EngineError> {
        self.dispatch(Action::DismissError).await
    }

    pub async fn toggle_theme(&self) -> Result<SessionSnapshot, EngineError> {
        self.dispatch(Action::ToggleTheme).await
    }

    /// Number of blob references currently held by the session.
    pub async fn live_references(&self) -> Result<usize, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::LiveReferences { reply })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    async fn settled(
        &self,
        done: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, EngineError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(done)
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        Ok(snapshot.clone())
    }
}

struct Engine {
    session: Session,
    store: BlobStore,
    search: Arc<dyn TargetSearch>,
    processor: Arc<dyn SwapProcessor>,
    exporter: Exporter,
    export_reply: Option<ExportReply>,
    timeouts: Timeouts,
    completions: mpsc::UnboundedSender<Completion>,
    snapshots: watch::Sender<SessionSnapshot>,
}

/// Spawn the engine on the current tokio runtime.
///
/// The engine task owns the session and every blob it hands out. It exits
/// once all handles are dropped, releasing whatever the session still holds.
pub fn spawn_engine(
    search: Arc<dyn TargetSearch>,
    processor: Arc<dyn SwapProcessor>,
    timeouts: Timeouts,
) -> Result<EngineHandle, EngineError> {
    let exporter = Exporter::new()?;
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(16);
    let (completions, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let (snapshots, snapshot_rx) = watch::channel(SessionSnapshot::default());

    tracing::info!(
        search = search.name(),
        search_timeout = ?timeouts.search,
        process_timeout = ?timeouts.process,
        "engine starting"
    );

    let mut engine = Engine {
        session: Session::new(),
        store: BlobStore::new(),
        search,
        processor,
        exporter,
        export_reply: None,
        timeouts,
        completions,
        snapshots,
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                req = rx.recv() => match req {
                    Some(req) => engine.handle_request(req),
                    None => break,
                },
                Some(done) = done_rx.recv() => engine.handle_completion(done),
            }
        }
        engine.apply(Action::Reset);
        tracing::info!(live = engine.store.len(), "engine task exiting");
    });

    Ok(EngineHandle {
        tx,
        snapshots: snapshot_rx,
    })
}

impl Engine {
    fn handle_request(&mut self, req: EngineRequest) {
        match req {
            EngineRequest::Upload { slot, file, reply } => {
                let display = self.store.create(file.clone());
                let upload = UploadedImage { file, display };
                let action = match slot {
                    Slot::Source => Action::UploadSource(upload),
                    Slot::Target => Action::UploadTarget(upload),
                };
                self.apply(action);
                let _ = reply.send(self.snapshot());
            }
            EngineRequest::Dispatch { action, reply } => {
                self.apply(action);
                let _ = reply.send(self.snapshot());
            }
            EngineRequest::Download { dest_dir, reply } => {
                self.export_reply = Some(reply);
                self.apply(Action::Download { dest_dir });
                // No export effect means there was no result to save.
                if let Some(reply) = self.export_reply.take() {
                    let _ = reply.send(Err(EngineError::NoResult));
                }
            }
            EngineRequest::LiveReferences { reply } => {
                let _ = reply.send(self.store.len());
            }
        }
    }

    fn handle_completion(&mut self, done: Completion) {
        let action = match done {
            Completion::Search {
                request_id,
                outcome,
            } => Action::SearchFinished {
                request_id,
                outcome,
            },
            Completion::Process {
                request_id,
                outcome,
            } => {
                let outcome = outcome.map(|output| {
                    let reference = match output {
                        SwapOutput::Remote(url) => DisplayRef::Remote(url),
                        SwapOutput::Image(file) => self.store.create(file),
                    };
                    ProcessingResult {
                        reference,
                        completed_at: chrono::Utc::now(),
                    }
                });
                Action::ProcessFinished {
                    request_id,
                    outcome,
                }
            }
        };
        self.apply(action);
    }

    fn apply(&mut self, action: Action) {
        for effect in self.session.update(action) {
            self.run_effect(effect);
        }
        self.snapshots.send_replace(self.snapshot());
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Release(reference) => {
                self.store.revoke(&reference);
            }
            Effect::Search { request_id, query } => {
                let search = Arc::clone(&self.search);
                let limit = self.timeouts.search;
                let done = self.completions.clone();
                tokio::spawn(async move {
                    let outcome = match tokio::time::timeout(limit, search.search(&query)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(SearchError::Timeout(limit)),
                    };
                    let _ = done.send(Completion::Search {
                        request_id,
                        outcome,
                    });
                });
            }
            Effect::Process { request_id, job } => {
                self.spawn_process(request_id, job);
            }
            Effect::Export { reference, path } => {
                let Some(reply) = self.export_reply.take() else {
                    tracing::warn!(reference = %reference, "export without a waiting caller dropped");
                    return;
                };
                let source = match ExportSource::resolve(&reference, &self.store) {
                    Ok(source) => source,
                    Err(e) => {
                        let _ = reply.send(Err(e.into()));
                        return;
                    }
                };
                let exporter = self.exporter.clone();
                tokio::spawn(async move {
                    let result = exporter.export(source, &path).await.map_err(EngineError::from);
                    let _ = reply.send(result);
                });
            }
        }
    }

    fn spawn_process(&self, request_id: RequestId, job: SwapJob) {
        let processor = Arc::clone(&self.processor);
        let limit = self.timeouts.process;
        let done = self.completions.clone();
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(limit, processor.process(job)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SwapError::Timeout(limit)),
            };
            let _ = done.send(Completion::Process {
                request_id,
                outcome,
            });
        });
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::of(&self.session)
    }
}
