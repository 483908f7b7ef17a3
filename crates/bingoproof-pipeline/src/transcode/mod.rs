//! Transcoder contract and its two implementations.
//!
//! Both implementations produce a bounded-size output blob from an input
//! blob behind the same trait, so the orchestrator is agnostic to which one
//! executed.

pub mod local;
pub mod remote;

pub use local::{LocalTranscoder, LocalTranscoderConfig};
pub use remote::{RemoteTranscoder, RemoteTranscoderConfig};

use async_trait::async_trait;
use bingoproof_core::{TranscodeRequest, TranscodeResult};
use std::time::Duration;
use thiserror::Error;

/// Transcode failures
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("Encode failed: {0}")]
    EncodeFailed(String),

    #[error("Transcode timed out after {limit:?}")]
    Timeout { limit: Duration },

    #[error("Transcoding unavailable: {0}")]
    Unavailable(String),
}

/// A transcoder turns one input blob into one bounded-size output blob.
/// A failed transcode never partially applies a result.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, req: TranscodeRequest) -> Result<TranscodeResult, TranscodeError>;
}
