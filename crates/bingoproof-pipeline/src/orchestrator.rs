//! Pipeline orchestrator: validate → probe → route → (transcode) → upload →
//! commit, strictly in that order.
//!
//! No stage is retried automatically. A failure surfaces to the caller with
//! the stage attached; the caller may re-invoke the whole pipeline with the
//! same input. That gives at-least-once semantics for the caller and
//! exactly-once effect on the progress record, because commit overwrites
//! rather than appends.

use std::sync::Arc;

use bingoproof_core::{
    Capability, MediaAsset, PipelineOutcome, PipelineStage, RejectReason, Strategy, TargetCodec,
    TranscodeRequest,
};
use bingoproof_progress::{ProgressError, ProgressStore};
use bingoproof_storage::{keys, Storage, StorageError};
use bytes::Bytes;
use uuid::Uuid;

use crate::capability::CapabilityProbe;
use crate::clock::MonotonicClock;
use crate::recorder::CompletionRecorder;
use crate::strategy::select_strategy;
use crate::transcode::{TranscodeError, Transcoder};
use crate::validator::{self, ValidationError};

/// One proof submission for one checklist cell. The sole inbound interface;
/// everything else about the board is some other component's problem.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub cell_id: Uuid,
    pub group_id: Uuid,
    pub bytes: Bytes,
    pub declared_mime_type: String,
}

/// Terminal pipeline failures
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large for this device: {size_bytes} bytes (ceiling {ceiling_bytes} bytes)")]
    TooLargeForDevice { size_bytes: u64, ceiling_bytes: u64 },

    #[error("Transcode failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Storage upload failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Progress update failed: {0}")]
    Progress(#[from] ProgressError),
}

impl From<ValidationError> for PipelineError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyFile => PipelineError::InvalidInput("empty file".to_string()),
            ValidationError::UnsupportedType(mime) => PipelineError::UnsupportedType(mime),
        }
    }
}

impl PipelineError {
    /// The stage the pipeline was in when it failed. Commit is the
    /// transition out of `Uploading`, so progress failures report that
    /// stage.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::UnsupportedType(_) | PipelineError::InvalidInput(_) => {
                PipelineStage::Received
            }
            PipelineError::TooLargeForDevice { .. } => PipelineStage::Routed,
            PipelineError::Transcode(_) => PipelineStage::Transcoding,
            PipelineError::Storage(_) | PipelineError::Progress(_) => PipelineStage::Uploading,
        }
    }
}

/// Sequences the pipeline components and owns the abort policy. The only
/// component the surrounding application calls.
pub struct PipelineOrchestrator {
    probe: Arc<dyn CapabilityProbe>,
    storage: Arc<dyn Storage>,
    recorder: CompletionRecorder,
    local: Option<Arc<dyn Transcoder>>,
    remote: Option<Arc<dyn Transcoder>>,
    video_bitrate_bps: u32,
    clock: MonotonicClock,
}

impl PipelineOrchestrator {
    pub fn new(
        probe: Arc<dyn CapabilityProbe>,
        storage: Arc<dyn Storage>,
        progress: Arc<dyn ProgressStore>,
        local: Option<Arc<dyn Transcoder>>,
        remote: Option<Arc<dyn Transcoder>>,
        video_bitrate_bps: u32,
    ) -> Self {
        Self {
            probe,
            storage,
            recorder: CompletionRecorder::new(progress),
            local,
            remote,
            video_bitrate_bps,
            clock: MonotonicClock::new(),
        }
    }

    /// Run one submission through the pipeline to its terminal state.
    pub async fn submit(&self, submit: SubmitRequest) -> Result<PipelineOutcome, PipelineError> {
        let SubmitRequest {
            cell_id,
            group_id,
            bytes,
            declared_mime_type,
        } = submit;

        let asset = MediaAsset::new(bytes, declared_mime_type);
        let size_bytes = asset.size_bytes;

        tracing::info!(
            cell_id = %cell_id,
            group_id = %group_id,
            size_bytes,
            mime = %asset.declared_mime_type,
            stage = %PipelineStage::Received,
            "Submission received"
        );

        let kind = validator::validate_asset(&asset)?;

        let capability = self.probe.probe();
        tracing::debug!(
            cell_id = %cell_id,
            supports_stream_capture = capability.supports_stream_capture,
            ceiling_bytes = capability.hard_size_ceiling_bytes,
            stage = %PipelineStage::Probed,
            "Capability probed"
        );

        let strategy = select_strategy(kind, size_bytes, &capability, self.local.is_some());
        tracing::info!(
            cell_id = %cell_id,
            strategy = ?strategy,
            stage = %PipelineStage::Routed,
            "Submission routed"
        );

        let (blob, content_type, extension) = match strategy {
            Strategy::Reject(RejectReason::TooLargeForDevice) => {
                return Err(PipelineError::TooLargeForDevice {
                    size_bytes,
                    ceiling_bytes: capability.hard_size_ceiling_bytes,
                });
            }
            Strategy::Reject(RejectReason::UnsupportedType) => {
                return Err(PipelineError::UnsupportedType(asset.declared_mime_type));
            }
            Strategy::DirectUpload => {
                tracing::debug!(cell_id = %cell_id, stage = %PipelineStage::DirectUploading, "Uploading raw bytes");
                let extension = validator::extension_for_mime(&asset.declared_mime_type);
                let content_type = mime_essence(&asset.declared_mime_type);
                (asset.bytes, content_type, extension)
            }
            Strategy::LocalTranscode => {
                self.run_transcode(
                    cell_id,
                    self.local.as_ref(),
                    TargetCodec::Vp9Webm,
                    asset,
                    &capability,
                )
                .await?
            }
            Strategy::RemoteTranscode => {
                self.run_transcode(
                    cell_id,
                    self.remote.as_ref(),
                    TargetCodec::H264Mp4,
                    asset,
                    &capability,
                )
                .await?
            }
        };

        let key = keys::proof_key(group_id, cell_id, self.clock.now_millis(), extension);

        tracing::debug!(
            cell_id = %cell_id,
            key = %key,
            upload_bytes = blob.len(),
            stage = %PipelineStage::Uploading,
            "Uploading proof blob"
        );

        let url = self.storage.put(&key, blob, &content_type).await?;

        let record = self.recorder.commit(cell_id, &key).await?;

        tracing::info!(
            cell_id = %cell_id,
            storage_path = %key,
            url = %url,
            stage = %PipelineStage::Committed,
            "Pipeline run committed"
        );

        Ok(PipelineOutcome {
            storage_path: key,
            completed: record.completed,
        })
    }

    async fn run_transcode(
        &self,
        cell_id: Uuid,
        transcoder: Option<&Arc<dyn Transcoder>>,
        target_codec: TargetCodec,
        asset: MediaAsset,
        capability: &Capability,
    ) -> Result<(Bytes, String, &'static str), PipelineError> {
        let transcoder = transcoder.ok_or_else(|| {
            TranscodeError::Unavailable("no transcoder registered for the selected strategy".to_string())
        })?;

        tracing::debug!(
            cell_id = %cell_id,
            codec = ?target_codec,
            stage = %PipelineStage::Transcoding,
            "Transcoding submission"
        );

        let req = TranscodeRequest {
            asset,
            target_codec,
            bitrate_bps: self.video_bitrate_bps,
        };
        let input_bytes = req.asset.size_bytes;

        let result = transcoder.transcode(req).await?;

        // Size reduction is a soft guarantee: an oversized result is still
        // uploaded and committed rather than discarded.
        if result.size_bytes > capability.hard_size_ceiling_bytes {
            tracing::warn!(
                cell_id = %cell_id,
                input_bytes,
                output_bytes = result.size_bytes,
                ceiling_bytes = capability.hard_size_ceiling_bytes,
                "Transcoded output still exceeds the ceiling; uploading anyway"
            );
        }

        Ok((
            result.blob,
            target_codec.container_mime().to_string(),
            target_codec.extension(),
        ))
    }
}

/// MIME type without parameters, lowercased, for the storage content type.
fn mime_essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_essence_strips_parameters() {
        assert_eq!(mime_essence("video/webm; codecs=vp9"), "video/webm");
        assert_eq!(mime_essence("IMAGE/JPEG"), "image/jpeg");
    }

    #[test]
    fn test_error_stage_mapping() {
        assert_eq!(
            PipelineError::UnsupportedType("application/pdf".to_string()).stage(),
            PipelineStage::Received
        );
        assert_eq!(
            PipelineError::TooLargeForDevice {
                size_bytes: 2,
                ceiling_bytes: 1
            }
            .stage(),
            PipelineStage::Routed
        );
        assert_eq!(
            PipelineError::Transcode(TranscodeError::Timeout {
                limit: std::time::Duration::from_secs(1)
            })
            .stage(),
            PipelineStage::Transcoding
        );
        assert_eq!(
            PipelineError::Storage(StorageError::UploadFailed("nope".to_string())).stage(),
            PipelineStage::Uploading
        );
        assert_eq!(
            PipelineError::Progress(ProgressError::NotFound(Uuid::nil())).stage(),
            PipelineStage::Uploading
        );
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: PipelineError = ValidationError::UnsupportedType("text/html".to_string()).into();
        assert!(matches!(err, PipelineError::UnsupportedType(_)));

        let err: PipelineError = ValidationError::EmptyFile.into();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
