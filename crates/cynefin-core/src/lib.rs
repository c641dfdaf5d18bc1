pub mod error;
pub mod history;
pub mod session;
pub mod storage;

// Re-export common error type
pub use error::CynefinError;
pub use storage::KeyValueBackend;
