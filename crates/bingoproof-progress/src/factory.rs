use crate::{MemoryProgressStore, ProgressError, ProgressResult, ProgressStore};
use bingoproof_core::{Config, ProgressBackend};
use std::sync::Arc;

/// Create a progress store based on configuration
pub async fn create_progress_store(config: &Config) -> ProgressResult<Arc<dyn ProgressStore>> {
    match config.progress_backend {
        ProgressBackend::Memory => Ok(Arc::new(MemoryProgressStore::new())),

        #[cfg(feature = "postgres")]
        ProgressBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                ProgressError::ConfigError("DATABASE_URL not configured".to_string())
            })?;
            let store = crate::PgProgressStore::connect(database_url).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "postgres"))]
        ProgressBackend::Postgres => Err(ProgressError::ConfigError(
            "Postgres progress backend not available (postgres feature not enabled)".to_string(),
        )),
    }
}
