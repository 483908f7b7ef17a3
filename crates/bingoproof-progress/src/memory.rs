//! In-memory progress store for tests and single-process deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use bingoproof_core::UploadRecord;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::traits::{ProgressError, ProgressResult, ProgressStore};

/// Progress store backed by a map. The write lock gives the same per-row
/// serialization the Postgres backend gets from its conditional update.
#[derive(Default)]
pub struct MemoryProgressStore {
    rows: RwLock<HashMap<Uuid, UploadRecord>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn assign(&self, cell_id: Uuid, group_id: Uuid) -> ProgressResult<UploadRecord> {
        let mut rows = self.rows.write().await;
        let record = rows
            .entry(cell_id)
            .or_insert_with(|| UploadRecord::assigned(cell_id, group_id));
        Ok(record.clone())
    }

    async fn get(&self, cell_id: Uuid) -> ProgressResult<Option<UploadRecord>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&cell_id).cloned())
    }

    async fn commit(&self, cell_id: Uuid, storage_path: &str) -> ProgressResult<UploadRecord> {
        let mut rows = self.rows.write().await;
        let record = rows
            .get_mut(&cell_id)
            .ok_or(ProgressError::NotFound(cell_id))?;

        record.storage_path = Some(storage_path.to_string());
        record.completed = true;
        record.committed_at = Some(Utc::now());

        tracing::debug!(
            cell_id = %cell_id,
            storage_path = %storage_path,
            "Progress record committed (memory)"
        );

        Ok(record.clone())
    }
}
