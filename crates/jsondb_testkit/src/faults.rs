//! Fault injection for storage.
//!
//! [`FaultyBackend`] wraps an in-memory document and fails reads or writes
//! on demand, so recovery paths can be driven without touching the
//! filesystem.

use jsondb_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
use parking_lot::RwLock;
use std::io;
use std::sync::Arc;

/// Which operations currently fail.
#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    reads: bool,
    writes: bool,
}

/// A storage backend whose reads and writes can be made to fail.
///
/// Clones share both the document and the fault switches, so a test can
/// keep one handle while the store owns another.
#[derive(Debug, Default, Clone)]
pub struct FaultyBackend {
    inner: InMemoryBackend,
    faults: Arc<RwLock<Faults>>,
}

impl FaultyBackend {
    /// Creates a backend with no document and no faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding `data`.
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            inner: InMemoryBackend::with_data(data),
            faults: Arc::default(),
        }
    }

    /// Makes every read fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.faults.write().reads = fail;
    }

    /// Makes every write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.faults.write().writes = fail;
    }

    /// The current document.
    pub fn data(&self) -> Option<Vec<u8>> {
        self.inner.data()
    }

    fn injected(op: &str) -> StorageError {
        StorageError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("injected {op} failure"),
        ))
    }
}

impl StorageBackend for FaultyBackend {
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        if self.faults.read().reads {
            return Err(Self::injected("read"));
        }
        self.inner.read_all()
    }

    fn write_all(&mut self, data: &[u8]) -> StorageResult<()> {
        if self.faults.read().writes {
            return Err(Self::injected("write"));
        }
        self.inner.write_all(data)
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn describe(&self) -> String {
        format!("faulty:{}", self.inner.describe())
    }
}
