//! Business logic services.

pub mod catalog;
pub mod cleanup;
pub mod documents;
pub mod expiry;
pub mod storage;

pub use catalog::DocumentTypeCatalog;
pub use cleanup::{ExpirySweepConfig, start_expiry_sweep_task};
pub use documents::{DeletionReport, DocumentService, FileContent};
pub use storage::{MemoryStorage, S3Storage, StorageGateway};
