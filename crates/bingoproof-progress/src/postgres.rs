//! Postgres progress store: one row per cell in the `progress` table.

use async_trait::async_trait;
use bingoproof_core::UploadRecord;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::traits::{ProgressError, ProgressResult, ProgressStore};

/// Row type for the progress table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
struct ProgressRow {
    cell_id: Uuid,
    group_id: Uuid,
    storage_path: Option<String>,
    completed: bool,
    committed_at: Option<DateTime<Utc>>,
}

impl ProgressRow {
    fn into_record(self) -> UploadRecord {
        UploadRecord {
            cell_id: self.cell_id,
            group_id: self.group_id,
            storage_path: self.storage_path,
            completed: self.completed,
            committed_at: self.committed_at,
        }
    }
}

/// Progress store backed by Postgres.
#[derive(Clone)]
pub struct PgProgressStore {
    pool: PgPool,
}

impl PgProgressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and run pending migrations.
    pub async fn connect(database_url: &str) -> ProgressResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| ProgressError::ConfigError(format!("Database connection failed: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| ProgressError::ConfigError(format!("Migration failed: {}", e)))?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ProgressStore for PgProgressStore {
    #[tracing::instrument(skip(self), fields(db.table = "progress"))]
    async fn assign(&self, cell_id: Uuid, group_id: Uuid) -> ProgressResult<UploadRecord> {
        // ON CONFLICT DO NOTHING keeps an existing (possibly completed) row
        // intact; the follow-up select returns whichever row is current.
        sqlx::query(
            r#"
            INSERT INTO progress (cell_id, group_id, completed)
            VALUES ($1, $2, FALSE)
            ON CONFLICT (cell_id) DO NOTHING
            "#,
        )
        .bind(cell_id)
        .bind(group_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ProgressError::Backend(e.to_string()))?;

        let row: ProgressRow = sqlx::query_as::<Postgres, ProgressRow>(
            r#"
            SELECT cell_id, group_id, storage_path, completed, committed_at
            FROM progress
            WHERE cell_id = $1
            "#,
        )
        .bind(cell_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ProgressError::Backend(e.to_string()))?;

        Ok(row.into_record())
    }

    #[tracing::instrument(skip(self), fields(db.table = "progress"))]
    async fn get(&self, cell_id: Uuid) -> ProgressResult<Option<UploadRecord>> {
        let row: Option<ProgressRow> = sqlx::query_as::<Postgres, ProgressRow>(
            r#"
            SELECT cell_id, group_id, storage_path, completed, committed_at
            FROM progress
            WHERE cell_id = $1
            "#,
        )
        .bind(cell_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProgressError::Backend(e.to_string()))?;

        Ok(row.map(ProgressRow::into_record))
    }

    #[tracing::instrument(skip(self), fields(db.table = "progress"))]
    async fn commit(&self, cell_id: Uuid, storage_path: &str) -> ProgressResult<UploadRecord> {
        // Single conditional update keyed by the row; no read-modify-write,
        // so concurrent commits serialize here and the last one wins.
        let row: Option<ProgressRow> = sqlx::query_as::<Postgres, ProgressRow>(
            r#"
            UPDATE progress
            SET storage_path = $2, completed = TRUE, committed_at = NOW()
            WHERE cell_id = $1
            RETURNING cell_id, group_id, storage_path, completed, committed_at
            "#,
        )
        .bind(cell_id)
        .bind(storage_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProgressError::Backend(e.to_string()))?;

        let record = row
            .map(ProgressRow::into_record)
            .ok_or(ProgressError::NotFound(cell_id))?;

        tracing::info!(
            cell_id = %cell_id,
            storage_path = %storage_path,
            "Progress record committed"
        );

        Ok(record)
    }
}
