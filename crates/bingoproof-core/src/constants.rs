//! Policy constants for the ingestion pipeline.
//!
//! These are the fixed limits and encoder settings the pipeline applies when
//! no explicit configuration overrides them. Changing a value here changes
//! routing and output quality for every submission.

/// Maximum raw upload size permitted when local transcoding is unavailable.
pub const DEFAULT_HARD_SIZE_CEILING_BYTES: u64 = 48 * 1024 * 1024;

/// Fixed video bitrate for the local VP9 re-encode. Chosen for guaranteed
/// size reduction over visual quality; not an adaptive target-size search.
pub const DEFAULT_LOCAL_VIDEO_BITRATE_BPS: u32 = 2_500_000;

/// Audio bitrate used by both transcode paths.
pub const AUDIO_BITRATE: &str = "128k";

/// Margin added to the source duration when bounding a local encode.
/// The encoder must run for the full playback length; past that plus this
/// grace the child is killed and the transcode reports a timeout.
pub const DEFAULT_ENCODE_GRACE_SECS: u64 = 30;

/// Upper bound on the serialized remote transcode request body. The remote
/// service's transport rejects anything larger, so the client refuses to
/// send it at all.
pub const DEFAULT_REMOTE_MAX_REQUEST_BYTES: u64 = 500 * 1000 * 1000;

/// End-to-end timeout for one remote transcode call.
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 300;

/// Constant-rate factor the remote service encodes H.264 with.
pub const REMOTE_VIDEO_CRF: u8 = 28;

/// Resolution cap (output height) applied by the remote service.
pub const REMOTE_VIDEO_MAX_HEIGHT: u32 = 720;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_is_48_mib() {
        assert_eq!(DEFAULT_HARD_SIZE_CEILING_BYTES, 50_331_648);
    }

    #[test]
    fn test_remote_request_cap_below_local_ceiling_order() {
        // A file small enough to upload raw must always fit in a remote request.
        assert!(DEFAULT_HARD_SIZE_CEILING_BYTES < DEFAULT_REMOTE_MAX_REQUEST_BYTES);
    }
}
