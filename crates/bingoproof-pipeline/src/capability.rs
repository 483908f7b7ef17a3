//! Capability probe: what the current host can do with oversized video.

use bingoproof_core::Capability;

/// Determines the capability of the current runtime: whether a live
/// re-encoded stream can be captured locally, and the hard size ceiling that
/// applies to raw uploads when it cannot.
///
/// Probing is a pure query with no side effects and must be deterministic
/// for a given host, so routing decisions stay testable.
pub trait CapabilityProbe: Send + Sync {
    fn probe(&self) -> Capability;
}

/// Probe for the host this process runs on: stream capture is available
/// exactly when a runnable ffmpeg binary can be located.
pub struct HostCapabilityProbe {
    ffmpeg_path: String,
    hard_size_ceiling_bytes: u64,
}

impl HostCapabilityProbe {
    pub fn new(ffmpeg_path: impl Into<String>, hard_size_ceiling_bytes: u64) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            hard_size_ceiling_bytes,
        }
    }
}

impl CapabilityProbe for HostCapabilityProbe {
    fn probe(&self) -> Capability {
        let supports_stream_capture = which::which(&self.ffmpeg_path).is_ok();

        tracing::debug!(
            ffmpeg_path = %self.ffmpeg_path,
            supports_stream_capture,
            hard_size_ceiling_bytes = self.hard_size_ceiling_bytes,
            "Host capability probed"
        );

        Capability {
            supports_stream_capture,
            hard_size_ceiling_bytes: self.hard_size_ceiling_bytes,
        }
    }
}

/// Probe returning a fixed capability. Used in tests and by callers that
/// carry a client-reported capability instead of probing the host.
pub struct FixedCapabilityProbe(pub Capability);

impl CapabilityProbe for FixedCapabilityProbe {
    fn probe(&self) -> Capability {
        self.0
    }
}
