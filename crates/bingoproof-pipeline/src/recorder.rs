//! Completion recorder: the last step of a successful pipeline run.

use std::sync::Arc;

use bingoproof_core::UploadRecord;
use bingoproof_progress::{ProgressResult, ProgressStore};
use uuid::Uuid;

/// Marks a cell's progress row with its final storage path.
///
/// Must only run after the upload succeeded; the underlying store's
/// conditional update makes the commit idempotent and serializes concurrent
/// commits for the same cell (last write wins).
#[derive(Clone)]
pub struct CompletionRecorder {
    store: Arc<dyn ProgressStore>,
}

impl CompletionRecorder {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    pub async fn commit(&self, cell_id: Uuid, storage_path: &str) -> ProgressResult<UploadRecord> {
        let record = self.store.commit(cell_id, storage_path).await?;

        tracing::info!(
            cell_id = %cell_id,
            storage_path = %storage_path,
            "Cell completion committed"
        );

        Ok(record)
    }
}
