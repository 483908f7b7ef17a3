//! Bingoproof Core Library
//!
//! This crate provides the domain models, policy constants, and configuration
//! shared across all bingoproof components: the media types flowing through
//! the ingestion pipeline and the record that outlives a pipeline run.

pub mod config;
pub mod constants;
pub mod models;

// Re-export commonly used types
pub use config::{load_dotenv, Config, ConfigError, ProgressBackend, StorageBackend};
pub use models::{
    Capability, MediaAsset, MediaKind, PipelineOutcome, PipelineStage, RejectReason, Strategy,
    TargetCodec, TranscodeRequest, TranscodeResult, UploadRecord,
};
