//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level whole-document storage backend for JsonDB.
///
/// Storage backends are **opaque byte stores** holding a single document.
/// JsonDB owns all format interpretation - backends do not know about JSON,
/// hex encoding or encryption.
///
/// # Invariants
///
/// - `read_all` returns exactly the bytes of the last successful `write_all`
/// - `read_all` on a document that was never written fails with
///   [`StorageError::NotFound`](crate::StorageError::NotFound)
/// - `write_all` replaces the whole document; it is not atomic
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the entire document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The document does not exist (`NotFound`)
    /// - An I/O error occurs
    fn read_all(&self) -> StorageResult<Vec<u8>>;

    /// Overwrites the entire document with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs. The previous content may
    /// already be truncated when this fails.
    fn write_all(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Returns the current size of the document in bytes (0 if missing).
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs the last write, data and metadata, to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}
