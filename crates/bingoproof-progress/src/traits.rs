//! Progress store abstraction trait

use async_trait::async_trait;
use bingoproof_core::UploadRecord;
use thiserror::Error;
use uuid::Uuid;

/// Progress store errors
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("No progress row for cell {0}")]
    NotFound(Uuid),

    #[error("Progress backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for progress store operations
pub type ProgressResult<T> = Result<T, ProgressError>;

/// Store of per-cell upload records.
///
/// `commit` is the only mutation the pipeline performs; it must be a
/// row-conditional update (no read-modify-write) so concurrent commits for
/// the same cell serialize at the row and the last writer wins. Committing
/// the same `(cell, path)` twice leaves the record in the same observable
/// state as committing it once.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Create the record for a newly assigned cell (`completed = false`, no
    /// path). Assigning an already assigned cell returns the existing record
    /// unchanged.
    async fn assign(&self, cell_id: Uuid, group_id: Uuid) -> ProgressResult<UploadRecord>;

    /// Fetch the record for a cell, if the cell was ever assigned.
    async fn get(&self, cell_id: Uuid) -> ProgressResult<Option<UploadRecord>>;

    /// Mark a cell complete with its final storage path. Fails with
    /// [`ProgressError::NotFound`] if the cell was never assigned.
    async fn commit(&self, cell_id: Uuid, storage_path: &str) -> ProgressResult<UploadRecord>;
}
