use crate::types::TargetCandidate;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("search provider unavailable: {0}")]
    Unavailable(String),
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
    #[error("search failed: {0}")]
    Failed(String),
}

/// Source of target candidates for a free-text query.
///
/// Results are ordered and ids are unique within one result set. An empty
/// list is a valid answer.
#[async_trait]
pub trait TargetSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<TargetCandidate>, SearchError>;
}
