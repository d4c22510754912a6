//! facegif-core — Session workflow for the FaceGIF swap demo.
//!
//! Holds the reducer that drives upload, search, select, process, and reset,
//! the blob store that owns uploaded image bytes, and the collaborator traits
//! for target search and swap processing.

pub mod search;
pub mod snapshot;
pub mod store;
pub mod swap;
pub mod types;
pub mod workflow;

pub use search::{SearchError, TargetSearch};
pub use snapshot::SessionSnapshot;
pub use store::BlobStore;
pub use swap::{EchoSwapProcessor, SwapError, SwapJob, SwapOutput, SwapProcessor, SwapTarget};
pub use types::{
    DisplayRef, ErrorKind, ImageFile, IntakeError, Phase, ProcessingResult, SessionError,
    TargetCandidate, TargetSelection, Theme, UploadedImage,
};
pub use workflow::{Action, Effect, RequestId, Session, SessionState, RESULT_FILE_NAME};
