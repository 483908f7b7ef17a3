//! Strategy selection: the single source of truth for routing a submission.

use bingoproof_core::{Capability, MediaKind, RejectReason, Strategy};

/// Map a submission to its handling strategy.
///
/// Rules, in priority order:
/// 1. Images always upload directly; they are never transcoded.
/// 2. Video at or under the ceiling uploads directly.
/// 3. Oversized video on a host without stream capture is rejected.
/// 4. Oversized video with stream capture transcodes locally when a local
///    transcoder is registered in-process, otherwise remotely.
///
/// Media kinds outside image/video never reach this function; they fail MIME
/// parsing in the validator, which is where "unsupported type" is decided.
/// No other component may re-derive any part of this decision.
pub fn select_strategy(
    kind: MediaKind,
    size_bytes: u64,
    capability: &Capability,
    local_transcoder_available: bool,
) -> Strategy {
    match kind {
        MediaKind::Image => Strategy::DirectUpload,
        MediaKind::Video => {
            if size_bytes <= capability.hard_size_ceiling_bytes {
                Strategy::DirectUpload
            } else if !capability.supports_stream_capture {
                Strategy::Reject(RejectReason::TooLargeForDevice)
            } else if local_transcoder_available {
                Strategy::LocalTranscode
            } else {
                Strategy::RemoteTranscode
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn capability(supports_stream_capture: bool) -> Capability {
        Capability {
            supports_stream_capture,
            hard_size_ceiling_bytes: 48 * MIB,
        }
    }

    #[test]
    fn test_images_always_direct_upload() {
        for supports in [false, true] {
            for size in [0, 2 * MIB, 80 * MIB, 10_000 * MIB] {
                assert_eq!(
                    select_strategy(MediaKind::Image, size, &capability(supports), true),
                    Strategy::DirectUpload
                );
                assert_eq!(
                    select_strategy(MediaKind::Image, size, &capability(supports), false),
                    Strategy::DirectUpload
                );
            }
        }
    }

    #[test]
    fn test_small_video_direct_upload() {
        for supports in [false, true] {
            assert_eq!(
                select_strategy(MediaKind::Video, 48 * MIB, &capability(supports), true),
                Strategy::DirectUpload
            );
            assert_eq!(
                select_strategy(MediaKind::Video, 1, &capability(supports), false),
                Strategy::DirectUpload
            );
        }
    }

    #[test]
    fn test_oversized_video_without_capture_rejected() {
        assert_eq!(
            select_strategy(MediaKind::Video, 80 * MIB, &capability(false), true),
            Strategy::Reject(RejectReason::TooLargeForDevice)
        );
        assert_eq!(
            select_strategy(MediaKind::Video, 48 * MIB + 1, &capability(false), false),
            Strategy::Reject(RejectReason::TooLargeForDevice)
        );
    }

    #[test]
    fn test_oversized_video_with_capture_prefers_local() {
        assert_eq!(
            select_strategy(MediaKind::Video, 80 * MIB, &capability(true), true),
            Strategy::LocalTranscode
        );
    }

    #[test]
    fn test_oversized_video_with_capture_falls_back_to_remote() {
        assert_eq!(
            select_strategy(MediaKind::Video, 80 * MIB, &capability(true), false),
            Strategy::RemoteTranscode
        );
    }

    #[test]
    fn test_ceiling_boundary_is_inclusive() {
        let cap = capability(true);
        assert_eq!(
            select_strategy(MediaKind::Video, cap.hard_size_ceiling_bytes, &cap, true),
            Strategy::DirectUpload
        );
        assert_eq!(
            select_strategy(MediaKind::Video, cap.hard_size_ceiling_bytes + 1, &cap, true),
            Strategy::LocalTranscode
        );
    }
}
