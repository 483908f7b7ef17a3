//! Build a ready-to-use pipeline from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use bingoproof_core::Config;
use bingoproof_progress::create_progress_store;
use bingoproof_storage::create_storage;

use crate::capability::HostCapabilityProbe;
use crate::orchestrator::PipelineOrchestrator;
use crate::transcode::{
    LocalTranscoder, LocalTranscoderConfig, RemoteTranscoder, RemoteTranscoderConfig, Transcoder,
};

/// Wire up storage, progress store, probe, and the available transcoders.
///
/// The local transcoder is registered only when its binaries are actually
/// runnable on this host; the remote transcoder only when an endpoint is
/// configured. The strategy selector sees exactly what got registered.
pub async fn build_pipeline(config: &Config) -> Result<PipelineOrchestrator> {
    config.validate().context("Invalid configuration")?;

    let storage = create_storage(config)
        .await
        .context("Failed to create storage backend")?;
    let progress = create_progress_store(config)
        .await
        .context("Failed to create progress store")?;

    let probe = Arc::new(HostCapabilityProbe::new(
        config.ffmpeg_path.clone(),
        config.hard_size_ceiling_bytes,
    ));

    let local_transcoder = LocalTranscoder::new(LocalTranscoderConfig {
        ffmpeg_path: config.ffmpeg_path.clone(),
        ffprobe_path: config.ffprobe_path.clone(),
        encode_grace: config.encode_grace(),
    });
    let local: Option<Arc<dyn Transcoder>> = if local_transcoder.is_available() {
        Some(Arc::new(local_transcoder))
    } else {
        tracing::warn!(
            ffmpeg_path = %config.ffmpeg_path,
            "Local transcoder unavailable; oversized video will route remotely or be rejected"
        );
        None
    };

    let remote: Option<Arc<dyn Transcoder>> = match &config.remote_transcode_url {
        Some(url) => {
            let remote_config = RemoteTranscoderConfig {
                endpoint: url.clone(),
                timeout: config.remote_timeout(),
                max_request_bytes: config.remote_max_request_bytes,
            };
            let transcoder =
                RemoteTranscoder::new(remote_config).context("Failed to create remote transcoder")?;
            Some(Arc::new(transcoder))
        }
        None => None,
    };

    Ok(PipelineOrchestrator::new(
        probe,
        storage,
        progress,
        local,
        remote,
        config.local_video_bitrate_bps,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_pipeline_from_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            local_storage_path: Some(dir.path().to_string_lossy().into_owned()),
            local_storage_base_url: Some("http://localhost:3000/media".to_string()),
            ..Config::default()
        };

        assert!(build_pipeline(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_build_pipeline_rejects_invalid_config() {
        // Local storage selected but no path configured.
        let config = Config::default();
        assert!(build_pipeline(&config).await.is_err());
    }
}
