//! Core traits for pluggable behavior.

mod storage;

pub use storage::StorageBackend;
