//! Swap processor contract and the demo echo implementation.
//!
//! The demo does no compositing: after a simulated delay it hands back the
//! target unchanged, either the candidate URL or the uploaded target bytes.

use crate::types::{ImageFile, TargetCandidate, UploadedImage};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ECHO_DELAY_MS: u64 = 3000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("processing timed out after {0:?}")]
    Timeout(Duration),
    #[error("processing failed: {0}")]
    Failed(String),
}

/// Target handed to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapTarget {
    Candidate(TargetCandidate),
    Photo(ImageFile),
}

/// One processing request: the user's face plus the chosen target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapJob {
    pub source: ImageFile,
    pub target: SwapTarget,
}

impl SwapJob {
    pub fn new(source: &UploadedImage, target: SwapTarget) -> Self {
        Self {
            source: source.file.clone(),
            target,
        }
    }
}

/// What a processor produced. `Image` outputs get a fresh blob reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutput {
    Remote(String),
    Image(ImageFile),
}

#[async_trait]
pub trait SwapProcessor: Send + Sync {
    async fn process(&self, job: SwapJob) -> Result<SwapOutput, SwapError>;
}

/// Demo processor: waits, then echoes the target back.
#[derive(Debug, Clone)]
pub struct EchoSwapProcessor {
    delay: Duration,
    jitter: Duration,
}

impl Default for EchoSwapProcessor {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_ECHO_DELAY_MS), Duration::ZERO)
    }
}

impl EchoSwapProcessor {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self { delay, jitter }
    }

    fn simulated_latency(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        self.delay + Duration::from_millis(extra)
    }
}

#[async_trait]
impl SwapProcessor for EchoSwapProcessor {
    async fn process(&self, job: SwapJob) -> Result<SwapOutput, SwapError> {
        let latency = self.simulated_latency();
        tracing::debug!(
            source = %job.source.name,
            latency_ms = latency.as_millis() as u64,
            "echo swap started"
        );
        tokio::time::sleep(latency).await;

        Ok(match job.target {
            SwapTarget::Candidate(candidate) => SwapOutput::Remote(candidate.url),
            SwapTarget::Photo(file) => SwapOutput::Image(file),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DisplayRef;

    fn upload(name: &str, tail: u8) -> UploadedImage {
        UploadedImage {
            file: ImageFile::from_bytes(name, vec![0xFF, 0xD8, 0xFF, tail]).unwrap(),
            display: DisplayRef::Remote(format!("local/{name}")),
        }
    }

    fn instant() -> EchoSwapProcessor {
        EchoSwapProcessor::new(Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_echo_candidate_returns_url() {
        let candidate = TargetCandidate {
            id: "2".into(),
            url: "https://example.com/2.jpg".into(),
            label: "Smiling Face".into(),
        };
        let job = SwapJob::new(&upload("A.jpg", 1), SwapTarget::Candidate(candidate));
        let out = instant().process(job).await.unwrap();
        assert_eq!(out, SwapOutput::Remote("https://example.com/2.jpg".into()));
    }

    #[tokio::test]
    async fn test_echo_photo_is_byte_identical() {
        let target = upload("B.jpg", 7);
        let job = SwapJob::new(&upload("A.jpg", 1), SwapTarget::Photo(target.file.clone()));
        let SwapOutput::Image(file) = instant().process(job).await.unwrap() else {
            panic!("expected image output");
        };
        assert_eq!(file.bytes, target.file.bytes);
        assert_eq!(file.name, "B.jpg");
    }

    #[test]
    fn test_latency_within_jitter_bounds() {
        let p = EchoSwapProcessor::new(Duration::from_millis(10), Duration::from_millis(5));
        for _ in 0..50 {
            let l = p.simulated_latency();
            assert!(l >= Duration::from_millis(10) && l <= Duration::from_millis(15));
        }
    }

    #[test]
    fn test_default_delay() {
        assert_eq!(EchoSwapProcessor::default().simulated_latency(), Duration::from_millis(3000));
    }
}
