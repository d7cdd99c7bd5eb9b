//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A file-based storage backend.
///
/// Each write truncates the file and rewrites it in full. The file is not
/// created on [`open`](Self::open): a missing file is reported by
/// [`read_all`](StorageBackend::read_all) as `NotFound` so the layer above
/// can decide how to initialize it.
///
/// # Durability
///
/// - `write_all()` calls `File::flush()` to push data to the OS
/// - `sync()` calls `File::sync_all()` on the handle of the last write
///
/// # Example
///
/// ```no_run
/// use jsondb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("users.jsondb"));
/// backend.write_all(b"[]").unwrap();
/// backend.sync().unwrap();  // Ensure data is durable
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    /// Handle of the most recent write, kept for `sync`.
    last_write: RwLock<Option<File>>,
}

impl FileBackend {
    /// Creates a backend for the file at `path`.
    ///
    /// Nothing is touched on disk until the first read or write.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            last_write: RwLock::new(None),
        }
    }

    /// Creates a backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self::open(path))
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::not_found(&self.path))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> StorageResult<()> {
        let mut slot = self.last_write.write();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(data)?;
        file.flush()?;
        *slot = Some(file);
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn sync(&mut self) -> StorageResult<()> {
        if let Some(file) = self.last_write.read().as_ref() {
            file.sync_all()?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
