//! # CareLog Storage
//!
//! Byte backends underneath the CareLog collection logs.
//!
//! A backend is an **opaque, append-only byte store**. It knows nothing
//! about records, frames or collections; `carelog_core` owns the log format
//! and only asks a backend to append bytes, read them back, make them
//! durable, and cut off a torn tail after a crash.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - for tests and throwaway stores
//! - [`FileBackend`] - one OS file per collection log
//!
//! ## Example
//!
//! ```rust
//! use carelog_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"frame").unwrap();
//! backend.sync().unwrap();
//! assert_eq!(backend.read_at(offset, 5).unwrap(), b"frame");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
