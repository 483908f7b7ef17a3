//! End-to-end pipeline tests over stub transcoders, temp-dir storage, and the
//! in-memory progress store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use bingoproof_core::{Capability, PipelineStage, TranscodeRequest, TranscodeResult};
use bingoproof_pipeline::{
    FixedCapabilityProbe, PipelineError, PipelineOrchestrator, SubmitRequest, TranscodeError,
    Transcoder,
};
use bingoproof_progress::{MemoryProgressStore, ProgressStore};
use bingoproof_storage::{LocalStorage, Storage};

/// Transcoder stub that returns fixed bytes and counts invocations.
struct StubTranscoder {
    output: &'static [u8],
    calls: AtomicUsize,
}

impl StubTranscoder {
    fn new(output: &'static [u8]) -> Arc<Self> {
        Arc::new(Self {
            output,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for StubTranscoder {
    async fn transcode(&self, _req: TranscodeRequest) -> Result<TranscodeResult, TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TranscodeResult::new(Bytes::from_static(self.output)))
    }
}

/// Transcoder stub that always times out.
struct TimingOutTranscoder;

#[async_trait]
impl Transcoder for TimingOutTranscoder {
    async fn transcode(&self, _req: TranscodeRequest) -> Result<TranscodeResult, TranscodeError> {
        Err(TranscodeError::Timeout {
            limit: Duration::from_secs(300),
        })
    }
}

struct Harness {
    orchestrator: PipelineOrchestrator,
    storage: Arc<LocalStorage>,
    progress: Arc<MemoryProgressStore>,
    cell_id: Uuid,
    group_id: Uuid,
    _dir: tempfile::TempDir,
}

async fn harness(
    capability: Capability,
    local: Option<Arc<dyn Transcoder>>,
    remote: Option<Arc<dyn Transcoder>>,
) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(
        LocalStorage::new(dir.path(), "http://localhost:3000/media".to_string())
            .await
            .unwrap(),
    );
    let progress = Arc::new(MemoryProgressStore::new());

    let cell_id = Uuid::new_v4();
    let group_id = Uuid::new_v4();
    progress.assign(cell_id, group_id).await.unwrap();

    let orchestrator = PipelineOrchestrator::new(
        Arc::new(FixedCapabilityProbe(capability)),
        storage.clone(),
        progress.clone(),
        local,
        remote,
        2_500_000,
    );

    Harness {
        orchestrator,
        storage,
        progress,
        cell_id,
        group_id,
        _dir: dir,
    }
}

fn capability(supports_stream_capture: bool, ceiling: u64) -> Capability {
    Capability {
        supports_stream_capture,
        hard_size_ceiling_bytes: ceiling,
    }
}

fn submit_request(h: &Harness, bytes: Bytes, mime: &str) -> SubmitRequest {
    SubmitRequest {
        cell_id: h.cell_id,
        group_id: h.group_id,
        bytes,
        declared_mime_type: mime.to_string(),
    }
}

/// A video blob over every ceiling used in these tests.
fn oversized_video() -> Bytes {
    Bytes::from(vec![0u8; 80])
}

#[tokio::test]
async fn test_image_direct_upload_commits_record() {
    let h = harness(capability(false, 48), None, None).await;

    let outcome = h
        .orchestrator
        .submit(submit_request(
            &h,
            Bytes::from_static(b"jpeg bytes well over the tiny ceiling"),
            "image/jpeg",
        ))
        .await
        .unwrap();

    assert!(outcome.completed);
    assert!(outcome.storage_path.starts_with(&h.group_id.to_string()));
    assert!(outcome.storage_path.contains(&format!("/{}-", h.cell_id)));
    assert!(outcome.storage_path.ends_with(".jpg"));

    // Blob landed under the derived key, record points at it.
    let stored = h.storage.download(&outcome.storage_path).await.unwrap();
    assert_eq!(&stored, b"jpeg bytes well over the tiny ceiling");

    let record = h.progress.get(h.cell_id).await.unwrap().unwrap();
    assert!(record.completed);
    assert_eq!(
        record.storage_path.as_deref(),
        Some(outcome.storage_path.as_str())
    );
    assert!(record.committed_at.is_some());
}

#[tokio::test]
async fn test_small_video_uploads_directly() {
    let local = StubTranscoder::new(b"should never run");
    let h = harness(
        capability(true, 1024),
        Some(local.clone() as Arc<dyn Transcoder>),
        None,
    )
    .await;

    let outcome = h
        .orchestrator
        .submit(submit_request(&h, Bytes::from_static(b"small clip"), "video/mp4"))
        .await
        .unwrap();

    assert_eq!(local.calls(), 0);
    assert!(outcome.storage_path.ends_with(".mp4"));
    let stored = h.storage.download(&outcome.storage_path).await.unwrap();
    assert_eq!(&stored, b"small clip");
}

#[tokio::test]
async fn test_oversized_video_without_capture_is_rejected() {
    let h = harness(capability(false, 48), None, None).await;

    let err = h
        .orchestrator
        .submit(submit_request(&h, oversized_video(), "video/mp4"))
        .await
        .unwrap_err();

    match err {
        PipelineError::TooLargeForDevice {
            size_bytes,
            ceiling_bytes,
        } => {
            assert_eq!(size_bytes, 80);
            assert_eq!(ceiling_bytes, 48);
        }
        other => panic!("expected TooLargeForDevice, got {other:?}"),
    }

    // Record untouched.
    let record = h.progress.get(h.cell_id).await.unwrap().unwrap();
    assert!(!record.completed);
    assert!(record.storage_path.is_none());
}

#[tokio::test]
async fn test_oversized_video_with_capture_transcodes_locally() {
    let local = StubTranscoder::new(b"vp9 encoded output");
    let h = harness(
        capability(true, 48),
        Some(local.clone() as Arc<dyn Transcoder>),
        None,
    )
    .await;

    let outcome = h
        .orchestrator
        .submit(submit_request(&h, oversized_video(), "video/mp4"))
        .await
        .unwrap();

    assert_eq!(local.calls(), 1);
    assert!(outcome.storage_path.ends_with(".webm"));

    let stored = h.storage.download(&outcome.storage_path).await.unwrap();
    assert_eq!(&stored, b"vp9 encoded output");

    let record = h.progress.get(h.cell_id).await.unwrap().unwrap();
    assert!(record.completed);
}

#[tokio::test]
async fn test_oversized_video_without_local_transcoder_goes_remote() {
    let remote = StubTranscoder::new(b"h264 encoded output");
    let h = harness(
        capability(true, 48),
        None,
        Some(remote.clone() as Arc<dyn Transcoder>),
    )
    .await;

    let outcome = h
        .orchestrator
        .submit(submit_request(&h, oversized_video(), "video/mp4"))
        .await
        .unwrap();

    assert_eq!(remote.calls(), 1);
    assert!(outcome.storage_path.ends_with(".mp4"));
}

#[tokio::test]
async fn test_remote_timeout_fails_in_transcoding_stage() {
    let h = harness(
        capability(true, 48),
        None,
        Some(Arc::new(TimingOutTranscoder) as Arc<dyn Transcoder>),
    )
    .await;

    let err = h
        .orchestrator
        .submit(submit_request(&h, oversized_video(), "video/mp4"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), PipelineStage::Transcoding);
    assert!(matches!(
        err,
        PipelineError::Transcode(TranscodeError::Timeout { .. })
    ));

    let record = h.progress.get(h.cell_id).await.unwrap().unwrap();
    assert!(!record.completed);
    assert!(record.storage_path.is_none());
}

#[tokio::test]
async fn test_failed_submission_can_be_resubmitted() {
    let h = harness(
        capability(true, 48),
        None,
        Some(Arc::new(TimingOutTranscoder) as Arc<dyn Transcoder>),
    )
    .await;

    let err = h
        .orchestrator
        .submit(submit_request(&h, oversized_video(), "video/mp4"))
        .await
        .unwrap_err();
    assert_eq!(err.stage(), PipelineStage::Transcoding);

    // Caller retries with input that no longer needs the remote path.
    let outcome = h
        .orchestrator
        .submit(submit_request(&h, Bytes::from_static(b"short clip"), "video/mp4"))
        .await
        .unwrap();
    assert!(outcome.completed);
}

#[tokio::test]
async fn test_unsupported_type_is_rejected_untouched() {
    let h = harness(capability(true, 48), None, None).await;

    let err = h
        .orchestrator
        .submit(submit_request(&h, Bytes::from_static(b"%PDF-1.7"), "application/pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UnsupportedType(_)));
    assert_eq!(err.stage(), PipelineStage::Received);

    let record = h.progress.get(h.cell_id).await.unwrap().unwrap();
    assert!(!record.completed);
}

#[tokio::test]
async fn test_empty_file_is_invalid_input() {
    let h = harness(capability(true, 48), None, None).await;

    let err = h
        .orchestrator
        .submit(submit_request(&h, Bytes::new(), "image/png"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[tokio::test]
async fn test_reupload_gets_fresh_key_and_overwrites_record() {
    let h = harness(capability(false, 1024), None, None).await;

    let first = h
        .orchestrator
        .submit(submit_request(&h, Bytes::from_static(b"first proof"), "image/png"))
        .await
        .unwrap();
    let second = h
        .orchestrator
        .submit(submit_request(&h, Bytes::from_static(b"second proof"), "image/png"))
        .await
        .unwrap();

    assert_ne!(first.storage_path, second.storage_path);

    // Old blob is orphaned but intact; the record points at the new one.
    assert!(h.storage.exists(&first.storage_path).await.unwrap());
    let record = h.progress.get(h.cell_id).await.unwrap().unwrap();
    assert_eq!(
        record.storage_path.as_deref(),
        Some(second.storage_path.as_str())
    );
}

#[tokio::test]
async fn test_concurrent_submissions_for_same_cell() {
    let h = Arc::new(harness(capability(false, 1024), None, None).await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = Arc::clone(&h);
        handles.push(tokio::spawn(async move {
            let request = submit_request(&h, Bytes::from_static(b"concurrent proof"), "image/jpeg");
            h.orchestrator.submit(request).await
        }));
    }

    let mut paths = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.completed);
        paths.push(outcome.storage_path);
    }

    // Every invocation uploaded to its own key.
    let mut deduped = paths.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), paths.len());

    // The record holds exactly one of the committed paths, whole.
    let record = h.progress.get(h.cell_id).await.unwrap().unwrap();
    let final_path = record.storage_path.unwrap();
    assert!(paths.contains(&final_path));
    assert!(record.completed);
}
