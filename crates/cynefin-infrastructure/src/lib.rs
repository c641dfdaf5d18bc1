pub mod backend;
pub mod codec;
pub mod config_service;
pub mod dto;
pub mod paths;
pub mod result_blob_store;
pub mod storage;
pub mod summary_index_store;

pub use crate::backend::{FileBackend, MemoryBackend};
pub use crate::codec::JsonCodec;
pub use crate::config_service::{ConfigService, CynefinConfig, StorageConfig};
pub use crate::result_blob_store::{BlobWriteReport, BlobWriteStatus, ResultBlobStore, ResultMap};
pub use crate::storage::{StorageAdapter, WriteOutcome};
pub use crate::summary_index_store::SummaryIndexStore;
