//! Bingoproof Storage Library
//!
//! Storage abstraction and backends for proof media blobs.
//!
//! # Key format
//!
//! Proof blobs are stored under `{group_id}/{cell_id}-{timestamp_millis}.{ext}`.
//! The timestamp comes from a monotonic clock, so repeated uploads for the
//! same cell never collide; superseded blobs are orphaned, never overwritten.
//! Keys must not contain `..` or a leading `/`. Key generation and validation
//! are centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use bingoproof_core::StorageBackend;
pub use factory::create_storage;
pub use keys::proof_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
