//! Bingoproof Progress Library
//!
//! The progress store holds one row per checklist cell: the `UploadRecord`
//! that the rest of the application reads to decide whether a cell is done.
//! Commit is a single conditional row update, so concurrent pipeline runs for
//! the same cell serialize at the row and the last commit wins.

pub mod factory;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod traits;

// Re-export commonly used types
pub use factory::create_progress_store;
pub use memory::MemoryProgressStore;
#[cfg(feature = "postgres")]
pub use postgres::PgProgressStore;
pub use traits::{ProgressError, ProgressResult, ProgressStore};
