//! Domain models for the media ingestion pipeline.
//!
//! `MediaAsset`, `TranscodeRequest`, and `TranscodeResult` live and die within
//! one pipeline invocation. `UploadRecord` is the only entity that outlives a
//! run; it is the system of record the rest of the application reads.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of media accepted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Derive the media kind from a declared MIME type. Parameters after `;`
    /// are ignored. Anything outside `image/*` and `video/*` is unsupported
    /// and yields `None`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        if essence.len() <= "image/".len() {
            return None;
        }
        let lower = essence.to_ascii_lowercase();
        if lower.starts_with("image/") {
            Some(MediaKind::Image)
        } else if lower.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// What the current host/device can do, probed once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Whether a live re-encoded stream can be captured from decoded media
    /// on this host (i.e. local stream-based transcoding is possible).
    pub supports_stream_capture: bool,
    /// Maximum raw upload size permitted when local transcoding is
    /// unavailable.
    pub hard_size_ceiling_bytes: u64,
}

/// Why a submission was rejected without running any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Media kind outside image/video.
    UnsupportedType,
    /// Video over the ceiling on a device that cannot transcode it.
    TooLargeForDevice,
}

/// The chosen path for handling one media submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DirectUpload,
    LocalTranscode,
    RemoteTranscode,
    Reject(RejectReason),
}

/// Output codec/container for a transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetCodec {
    H264Mp4,
    Vp9Webm,
}

impl TargetCodec {
    /// Container MIME type of the encoded output.
    pub fn container_mime(&self) -> &'static str {
        match self {
            TargetCodec::H264Mp4 => "video/mp4",
            TargetCodec::Vp9Webm => "video/webm",
        }
    }

    /// File extension for the encoded output, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetCodec::H264Mp4 => "mp4",
            TargetCodec::Vp9Webm => "webm",
        }
    }
}

/// A user-supplied media file as read from input. Immutable for the lifetime
/// of the pipeline invocation that owns it.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub bytes: Bytes,
    pub declared_mime_type: String,
    pub size_bytes: u64,
}

impl MediaAsset {
    pub fn new(bytes: Bytes, declared_mime_type: impl Into<String>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            bytes,
            declared_mime_type: declared_mime_type.into(),
            size_bytes,
        }
    }
}

/// One transcode job. Constructed by the routing decision, consumed exactly
/// once by a transcoder.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    pub asset: MediaAsset,
    pub target_codec: TargetCodec,
    pub bitrate_bps: u32,
}

/// Successful transcode output. `size_bytes` staying under the ceiling that
/// triggered the transcode is best-effort, not guaranteed.
#[derive(Debug, Clone)]
pub struct TranscodeResult {
    pub blob: Bytes,
    pub size_bytes: u64,
}

impl TranscodeResult {
    pub fn new(blob: Bytes) -> Self {
        let size_bytes = blob.len() as u64;
        Self { blob, size_bytes }
    }
}

/// Progress row for one checklist cell. Created when the cell is assigned
/// (`completed = false`, no path) and updated in place on every successful
/// pipeline run. At most one completed record exists per cell; a re-upload
/// overwrites, never appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub cell_id: Uuid,
    pub group_id: Uuid,
    pub storage_path: Option<String>,
    pub completed: bool,
    pub committed_at: Option<DateTime<Utc>>,
}

impl UploadRecord {
    /// A freshly assigned, not yet completed record.
    pub fn assigned(cell_id: Uuid, group_id: Uuid) -> Self {
        Self {
            cell_id,
            group_id,
            storage_path: None,
            completed: false,
            committed_at: None,
        }
    }
}

/// Pipeline state machine. Transitions are strictly sequential; a failure in
/// any non-terminal state surfaces to the caller with the stage attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Received,
    Probed,
    Routed,
    DirectUploading,
    Transcoding,
    Uploading,
    Committed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Probed => "probed",
            PipelineStage::Routed => "routed",
            PipelineStage::DirectUploading => "direct_uploading",
            PipelineStage::Transcoding => "transcoding",
            PipelineStage::Uploading => "uploading",
            PipelineStage::Committed => "committed",
        };
        write!(f, "{}", name)
    }
}

/// What a successful pipeline run hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub storage_path: String,
    pub completed: bool,
}
