//! Local transcoder: re-encode through an ffmpeg child process.
//!
//! The encode runs in real time, so it is allowed the full source duration
//! plus a fixed grace margin before being killed. The child is spawned with
//! kill-on-drop; cancelling the caller's future tears the encoder down.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bingoproof_core::constants::AUDIO_BITRATE;
use bingoproof_core::{TargetCodec, TranscodeRequest, TranscodeResult};
use bytes::Bytes;
use serde::Deserialize;
use tokio::process::Command;

use super::{TranscodeError, Transcoder};
use crate::validator::extension_for_mime;

/// Upper bound on a metadata probe; a decoder that cannot even parse the
/// container within this is treated as a failed decode.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// How much ffmpeg stderr to carry into an error message.
const STDERR_TAIL_BYTES: usize = 400;

/// Longest source duration accepted for a real-time re-encode. Anything past
/// this is a corrupt or hostile duration field, not a checklist proof clip.
const MAX_SOURCE_DURATION_SECS: f64 = 24.0 * 60.0 * 60.0;

#[derive(Debug, Clone)]
pub struct LocalTranscoderConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Margin added to the source duration when bounding the encode.
    pub encode_grace: Duration,
}

impl Default for LocalTranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            encode_grace: Duration::from_secs(
                bingoproof_core::constants::DEFAULT_ENCODE_GRACE_SECS,
            ),
        }
    }
}

/// In-process transcoder backed by ffmpeg.
pub struct LocalTranscoder {
    config: LocalTranscoderConfig,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
}

/// Parse ffprobe output into a source duration, failing fast on input that
/// has no video stream or no positive duration.
fn parse_probe_output(raw: &[u8]) -> Result<f64, TranscodeError> {
    let probe: FfprobeOutput = serde_json::from_slice(raw)
        .map_err(|e| TranscodeError::DecodeFailed(format!("unparsable probe output: {}", e)))?;

    if !probe.streams.iter().any(|s| s.codec_type == "video") {
        return Err(TranscodeError::DecodeFailed(
            "no video stream found".to_string(),
        ));
    }

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    if !duration.is_finite() || duration <= 0.0 {
        return Err(TranscodeError::DecodeFailed(
            "zero-duration or undecodable input".to_string(),
        ));
    }

    if duration > MAX_SOURCE_DURATION_SECS {
        return Err(TranscodeError::DecodeFailed(format!(
            "implausible source duration: {} seconds",
            duration
        )));
    }

    Ok(duration)
}

/// Deadline for one encode: the source's playback length plus the grace
/// margin. The encoder must be allowed to run for the full playback length;
/// anything past the margin is a hang.
fn encode_deadline(duration_secs: f64, grace: Duration) -> Duration {
    Duration::from_secs_f64(duration_secs) + grace
}

/// Encoder arguments for the fixed-bitrate re-encode.
fn encode_args(input: &Path, output: &Path, codec: TargetCodec, bitrate_bps: u32) -> Vec<String> {
    let mut args = vec![
        "-nostdin".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
    ];
    match codec {
        TargetCodec::Vp9Webm => args.extend([
            "-c:v".to_string(),
            "libvpx-vp9".to_string(),
            "-b:v".to_string(),
            bitrate_bps.to_string(),
            "-deadline".to_string(),
            "realtime".to_string(),
            "-cpu-used".to_string(),
            "4".to_string(),
            "-c:a".to_string(),
            "libopus".to_string(),
            "-b:a".to_string(),
            AUDIO_BITRATE.to_string(),
        ]),
        TargetCodec::H264Mp4 => args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-b:v".to_string(),
            bitrate_bps.to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            AUDIO_BITRATE.to_string(),
        ]),
    }
    args.push("-y".to_string());
    args.push(output.to_string_lossy().into_owned());
    args
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        trimmed.to_string()
    } else {
        let start = trimmed.len() - STDERR_TAIL_BYTES;
        // Stay on a char boundary.
        let start = (start..trimmed.len())
            .find(|i| trimmed.is_char_boundary(*i))
            .unwrap_or(start);
        trimmed[start..].to_string()
    }
}

impl LocalTranscoder {
    pub fn new(config: LocalTranscoderConfig) -> Self {
        Self { config }
    }

    /// Whether this host can run the encoder at all.
    pub fn is_available(&self) -> bool {
        which::which(&self.config.ffmpeg_path).is_ok()
            && which::which(&self.config.ffprobe_path).is_ok()
    }

    async fn probe_duration(&self, input: &Path) -> Result<f64, TranscodeError> {
        let mut cmd = Command::new(&self.config.ffprobe_path);
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let output = tokio::time::timeout(PROBE_TIMEOUT, cmd.output())
            .await
            .map_err(|_| TranscodeError::DecodeFailed("probe timed out".to_string()))?
            .map_err(|e| TranscodeError::Unavailable(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(TranscodeError::DecodeFailed(format!(
                "ffprobe failed: {}",
                stderr_tail(&output.stderr)
            )));
        }

        parse_probe_output(&output.stdout)
    }
}

#[async_trait]
impl Transcoder for LocalTranscoder {
    async fn transcode(&self, req: TranscodeRequest) -> Result<TranscodeResult, TranscodeError> {
        if !self.is_available() {
            return Err(TranscodeError::Unavailable(format!(
                "{} not found on this host",
                self.config.ffmpeg_path
            )));
        }

        let workdir = tempfile::tempdir()
            .map_err(|e| TranscodeError::EncodeFailed(format!("scratch dir: {}", e)))?;

        let input_path = workdir.path().join(format!(
            "input.{}",
            extension_for_mime(&req.asset.declared_mime_type)
        ));
        let output_path = workdir
            .path()
            .join(format!("output.{}", req.target_codec.extension()));

        tokio::fs::write(&input_path, &req.asset.bytes)
            .await
            .map_err(|e| TranscodeError::EncodeFailed(format!("write scratch input: {}", e)))?;

        let duration = self.probe_duration(&input_path).await?;
        let deadline = encode_deadline(duration, self.config.encode_grace);

        tracing::info!(
            input_bytes = req.asset.size_bytes,
            duration_secs = duration,
            deadline_secs = deadline.as_secs_f64(),
            codec = ?req.target_codec,
            bitrate_bps = req.bitrate_bps,
            "Starting local transcode"
        );

        let start = std::time::Instant::now();

        let mut cmd = Command::new(&self.config.ffmpeg_path);
        cmd.args(encode_args(
            &input_path,
            &output_path,
            req.target_codec,
            req.bitrate_bps,
        ))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        // kill_on_drop tears the encoder down when the timeout fires or the
        // caller cancels by dropping this future.
        let output = tokio::time::timeout(deadline, cmd.output())
            .await
            .map_err(|_| TranscodeError::Timeout { limit: deadline })?
            .map_err(|e| TranscodeError::Unavailable(format!("failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            return Err(TranscodeError::EncodeFailed(stderr_tail(&output.stderr)));
        }

        let encoded = tokio::fs::read(&output_path)
            .await
            .map_err(|e| TranscodeError::EncodeFailed(format!("read encoded output: {}", e)))?;

        if encoded.is_empty() {
            return Err(TranscodeError::EncodeFailed(
                "encoder produced no output".to_string(),
            ));
        }

        let result = TranscodeResult::new(Bytes::from(encoded));

        tracing::info!(
            input_bytes = req.asset.size_bytes,
            output_bytes = result.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local transcode finished"
        );

        Ok(result)
    }
}
