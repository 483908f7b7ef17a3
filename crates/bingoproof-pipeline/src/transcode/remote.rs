//! Remote transcoder: delegate the re-encode to a transcoding service.
//!
//! The service takes a base64 payload plus codec parameters, runs an
//! industry-standard encoder at a fixed quality (CRF 28, 720p cap), and
//! returns the encoded blob as the response body. The client refuses to send
//! requests that would exceed the service transport's body-size limit and
//! bounds every call with a timeout.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bingoproof_core::constants::{
    DEFAULT_REMOTE_MAX_REQUEST_BYTES, DEFAULT_REMOTE_TIMEOUT_SECS, REMOTE_VIDEO_CRF,
    REMOTE_VIDEO_MAX_HEIGHT,
};
use bingoproof_core::{TargetCodec, TranscodeRequest, TranscodeResult};
use serde::Serialize;

use super::{TranscodeError, Transcoder};

/// Fixed allowance for the JSON envelope around the base64 payload.
const REQUEST_ENVELOPE_BYTES: u64 = 256;

#[derive(Debug, Clone)]
pub struct RemoteTranscoderConfig {
    /// Transcode endpoint, e.g. `https://transcoder.internal/compress`.
    pub endpoint: String,
    /// End-to-end timeout for one call.
    pub timeout: Duration,
    /// Transport body-size limit; larger requests are refused client-side.
    pub max_request_bytes: u64,
}

impl RemoteTranscoderConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            max_request_bytes: DEFAULT_REMOTE_MAX_REQUEST_BYTES,
        }
    }
}

/// Wire format of one transcode call.
#[derive(Debug, Serialize)]
struct TranscodeRequestBody<'a> {
    payload: &'a str,
    codec: &'static str,
    bitrate_bps: u32,
    crf: u8,
    max_height: u32,
}

fn codec_name(codec: TargetCodec) -> &'static str {
    match codec {
        TargetCodec::H264Mp4 => "h264_mp4",
        TargetCodec::Vp9Webm => "vp9_webm",
    }
}

/// Size of the serialized request for a raw input of `raw_bytes`: base64
/// expansion plus the envelope.
fn encoded_request_size(raw_bytes: u64) -> u64 {
    raw_bytes.div_ceil(3) * 4 + REQUEST_ENVELOPE_BYTES
}

/// Transcoder that calls an external transcoding service.
pub struct RemoteTranscoder {
    client: reqwest::Client,
    config: RemoteTranscoderConfig,
}

impl RemoteTranscoder {
    pub fn new(config: RemoteTranscoderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> TranscodeError {
        if e.is_timeout() {
            TranscodeError::Timeout {
                limit: self.config.timeout,
            }
        } else {
            TranscodeError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl Transcoder for RemoteTranscoder {
    async fn transcode(&self, req: TranscodeRequest) -> Result<TranscodeResult, TranscodeError> {
        let request_size = encoded_request_size(req.asset.size_bytes);
        if request_size > self.config.max_request_bytes {
            return Err(TranscodeError::Unavailable(format!(
                "encoded request of {} bytes exceeds the transport limit of {} bytes",
                request_size, self.config.max_request_bytes
            )));
        }

        let payload = BASE64.encode(&req.asset.bytes);
        let body = TranscodeRequestBody {
            payload: &payload,
            codec: codec_name(req.target_codec),
            bitrate_bps: req.bitrate_bps,
            crf: REMOTE_VIDEO_CRF,
            max_height: REMOTE_VIDEO_MAX_HEIGHT,
        };

        tracing::info!(
            endpoint = %self.config.endpoint,
            input_bytes = req.asset.size_bytes,
            request_bytes = request_size,
            codec = ?req.target_codec,
            "Sending remote transcode request"
        );

        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranscodeError::Unavailable(format!(
                "transcoding service returned {}",
                status
            )));
        }

        let blob = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if blob.is_empty() {
            return Err(TranscodeError::Unavailable(
                "transcoding service returned an empty body".to_string(),
            ));
        }

        let result = TranscodeResult::new(blob);

        tracing::info!(
            endpoint = %self.config.endpoint,
            input_bytes = req.asset.size_bytes,
            output_bytes = result.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote transcode finished"
        );

        Ok(result)
    }
}
