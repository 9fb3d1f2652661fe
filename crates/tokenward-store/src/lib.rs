//! tokenward-store - Storage backends for the credential store.
//!
//! - [`MemoryBackend`] keeps values for the lifetime of the process and is the
//!   natural ephemeral backend for long-running applications.
//! - [`FileBackend`] keeps values in a JSON file and serves as the durable
//!   backend, or as an ephemeral one when pointed at a per-login runtime
//!   directory.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;
