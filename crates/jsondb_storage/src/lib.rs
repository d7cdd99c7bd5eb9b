//! # JsonDB Storage
//!
//! Storage backend trait and implementations for JsonDB.
//!
//! This crate provides the lowest-level storage abstraction for JsonDB.
//! A backend owns exactly one document and treats it as an **opaque
//! byte blob** - it never interprets JSON, hex, or ciphertext.
//!
//! ## Design Principles
//!
//! - Backends read and overwrite the whole document at once
//! - A missing document is reported as [`StorageError::NotFound`], distinct
//!   from every other I/O failure
//! - No write-ahead log and no atomic rename: a crash mid-write may leave a
//!   torn file, which the layer above treats as corruption
//! - Must be `Send + Sync`
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral collections
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use jsondb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.write_all(b"[]").unwrap();
//! assert_eq!(backend.read_all().unwrap(), b"[]");
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
