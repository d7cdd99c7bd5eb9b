//! Whole-file persistence of one collection.

use crate::config::{Config, EncryptionMode};
use crate::crypto::{Cipher, FieldCodec};
use crate::error::{Code, CoreError, CoreResult};
use jsondb_codec::{decode_records, encode_records, is_blank, Record};
use jsondb_storage::{FileBackend, StorageBackend};
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info};

/// What a read of the backing document produced.
enum Contents {
    /// Nothing but whitespace (after decryption in whole-file mode).
    Blank,
    /// A decoded collection.
    Records(Vec<Record>),
}

/// Owns one collection file and its encryption mode.
///
/// The store reads and writes the whole document every time. It recovers
/// on its own from a missing, empty, or unparsable file by writing a fresh
/// empty collection, and it never overwrites the file after any other read
/// error.
///
/// A store takes no locks. Callers that share one between threads must
/// serialize access themselves (the collection engine does).
pub struct Store {
    backend: Box<dyn StorageBackend>,
    mode: EncryptionMode,
    cipher: Option<Cipher>,
    sync_on_write: bool,
    pretty: bool,
    /// The collection as last loaded or saved.
    records: Vec<Record>,
}

impl Store {
    /// Opens the collection file at `path` and loads it.
    ///
    /// Parent directories are created if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured mode needs a key and none is set,
    /// or if parent directories cannot be created.
    pub fn open(path: &Path, config: &Config) -> CoreResult<Self> {
        let backend = FileBackend::open_with_create_dirs(path)?;
        Self::with_backend(Box::new(backend), config)
    }

    /// Creates a store over any backend and loads it.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` if the configured mode needs a key and none is
    /// set.
    pub fn with_backend(backend: Box<dyn StorageBackend>, config: &Config) -> CoreResult<Self> {
        let mut store = Self::detached(backend, config)?;
        store.load();
        Ok(store)
    }

    /// Creates a store over the file at `path` without reading or writing
    /// it.
    ///
    /// Nothing touches the file until [`load`](Self::load) or
    /// [`save`](Self::save) is called, so [`try_load`](Self::try_load) on a
    /// detached store inspects the file exactly as it is.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` if the configured mode needs a key and none is
    /// set.
    pub fn open_detached(path: &Path, config: &Config) -> CoreResult<Self> {
        Self::detached(Box::new(FileBackend::open(path)), config)
    }

    fn detached(backend: Box<dyn StorageBackend>, config: &Config) -> CoreResult<Self> {
        let mode = config.encryption;
        let cipher = if mode.requires_key() {
            let key = config
                .secret_key
                .as_ref()
                .ok_or(CoreError::MissingKey {
                    mode: mode.as_str(),
                })?;
            Some(Cipher::new(key))
        } else {
            None
        };

        Ok(Self {
            backend,
            mode,
            cipher,
            sync_on_write: config.sync_on_write,
            pretty: config.pretty,
            records: Vec::new(),
        })
    }

    /// The encryption mode of this store.
    #[must_use]
    pub fn mode(&self) -> EncryptionMode {
        self.mode
    }

    /// The collection as last loaded or saved.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Where the document lives, for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Size of the backing document in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Reads the collection, recovering where possible.
    ///
    /// | condition                     | result | file      |
    /// |-------------------------------|--------|-----------|
    /// | missing                       | empty  | rewritten |
    /// | blank                         | empty  | rewritten |
    /// | unparsable or undecryptable   | empty  | rewritten |
    /// | any other read error          | empty  | untouched |
    ///
    /// Data in an unparsable file is discarded; no partial recovery is
    /// attempted.
    pub fn load(&mut self) -> Vec<Record> {
        let path = self.backend.describe();
        let records = match self.read_contents() {
            Ok(Contents::Records(records)) => records,
            Ok(Contents::Blank) => {
                info!(code = %Code::FileEmpty, path = %path, "data file is empty, initializing");
                self.initialize();
                Vec::new()
            }
            Err(CoreError::Storage(e)) if e.is_not_found() => {
                info!(code = %Code::FileMissing, path = %path, "data file not found, creating it");
                self.initialize();
                Vec::new()
            }
            Err(e @ CoreError::DecryptionFailed { .. }) => {
                error!(code = %Code::DecryptionFailed, path = %path, error = %e, "cannot decrypt data file");
                error!(code = %Code::FileCorrupt, path = %path, "discarding undecryptable data file");
                self.initialize();
                Vec::new()
            }
            Err(e @ CoreError::Corruption { .. }) => {
                error!(code = %Code::FileCorrupt, path = %path, error = %e, "discarding unparsable data file");
                self.initialize();
                Vec::new()
            }
            Err(e) => {
                error!(code = %Code::ReadFailed, path = %path, error = %e, "cannot read data file, leaving it untouched");
                Vec::new()
            }
        };

        self.records.clone_from(&records);
        records
    }

    /// Reads and decodes the collection without any recovery.
    ///
    /// A blank document is an empty collection. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `Storage` for read failures (including a missing file),
    /// `DecryptionFailed` for key mismatches or malformed blobs, and
    /// `Corruption` for content that is not a collection document.
    pub fn try_load(&self) -> CoreResult<Vec<Record>> {
        match self.read_contents()? {
            Contents::Blank => Ok(Vec::new()),
            Contents::Records(records) => Ok(records),
        }
    }

    /// Replaces the collection and writes it out in full.
    ///
    /// The records become the in-memory collection even if the write
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, encryption, or the write fails. The
    /// failure is logged.
    pub fn save(&mut self, records: Vec<Record>) -> CoreResult<()> {
        self.records = records;
        let result = match self.encode(&self.records) {
            Ok(bytes) => self.write(&bytes),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            error!(
                code = %Code::SaveFailed,
                path = %self.backend.describe(),
                error = %e,
                "cannot save data file, keeping collection in memory"
            );
        }
        result
    }

    fn read_contents(&self) -> CoreResult<Contents> {
        let bytes = self.backend.read_all()?;
        if is_blank(&bytes) {
            return Ok(Contents::Blank);
        }

        let records = match (self.mode, &self.cipher) {
            (EncryptionMode::Whole, Some(cipher)) => {
                let text = std::str::from_utf8(&bytes)
                    .map_err(|_| CoreError::decryption_failed("blob is not text"))?;
                let plain = cipher.decrypt_hex(text.trim())?;
                if is_blank(&plain) {
                    return Ok(Contents::Blank);
                }
                decode_records(&plain).map_err(|e| CoreError::corruption(e.to_string()))?
            }
            (EncryptionMode::PerField, Some(cipher)) => {
                let stored =
                    decode_records(&bytes).map_err(|e| CoreError::corruption(e.to_string()))?;
                FieldCodec::new(cipher).decrypt_records(&stored)?
            }
            _ => decode_records(&bytes).map_err(|e| CoreError::corruption(e.to_string()))?,
        };
        Ok(Contents::Records(records))
    }

    fn encode(&self, records: &[Record]) -> CoreResult<Vec<u8>> {
        match (self.mode, &self.cipher) {
            (EncryptionMode::Whole, Some(cipher)) => {
                let plain = encode_records(records, self.pretty)?;
                Ok(cipher.encrypt_hex(&plain)?.into_bytes())
            }
            (EncryptionMode::PerField, Some(cipher)) => {
                let encrypted = FieldCodec::new(cipher).encrypt_records(records)?;
                Ok(encode_records(&encrypted, false)?)
            }
            _ => Ok(encode_records(records, self.pretty)?),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> CoreResult<()> {
        self.backend.write_all(bytes)?;
        if self.sync_on_write {
            self.backend.sync()?;
        }
        debug!(path = %self.backend.describe(), bytes = bytes.len(), "data file written");
        Ok(())
    }

    fn initialize(&mut self) {
        let result = match self.encode(&[]) {
            Ok(bytes) => self.write(&bytes),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!(
                code = %Code::InitFailed,
                path = %self.backend.describe(),
                error = %e,
                "cannot write initial data file"
            );
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.describe())
            .field("mode", &self.mode)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;
    use jsondb_storage::InMemoryBackend;
    use tempfile::tempdir;

    fn user(id: &str, name: &str) -> Record {
        Record::new().with("id", id).with("name", name).with("age", 30)
    }

    fn config(mode: EncryptionMode) -> Config {
        let config = Config::new().encryption(mode);
        if mode.requires_key() {
            config.secret_key(SecretKey::generate())
        } else {
            config
        }
    }

    fn memory_store(config: &Config) -> (InMemoryBackend, Store) {
        let backend = InMemoryBackend::new();
        let store = Store::with_backend(Box::new(backend.clone()), config).unwrap();
        (backend, store)
    }

    #[test]
    fn missing_file_is_initialized() {
        let (backend, store) = memory_store(&config(EncryptionMode::None));
        assert!(store.records().is_empty());
        assert_eq!(backend.data(), Some(b"[]".to_vec()));
    }

    #[test]
    fn blank_file_is_initialized() {
        let backend = InMemoryBackend::with_data(b"  \n".to_vec());
        let store =
            Store::with_backend(Box::new(backend.clone()), &config(EncryptionMode::None)).unwrap();
        assert!(store.records().is_empty());
        assert_eq!(backend.data(), Some(b"[]".to_vec()));
    }

    #[test]
    fn garbage_is_discarded() {
        let backend = InMemoryBackend::with_data(b"{not json".to_vec());
        let mut store =
            Store::with_backend(Box::new(backend.clone()), &config(EncryptionMode::None)).unwrap();
        assert!(store.load().is_empty());
        assert_eq!(backend.data(), Some(b"[]".to_vec()));
    }

    #[test]
    fn garbage_is_discarded_in_encrypted_modes() {
        for mode in [EncryptionMode::Whole, EncryptionMode::PerField] {
            let config = config(mode);
            let backend = InMemoryBackend::with_data(b"\x00\x01 garbage \xff".to_vec());
            let mut store = Store::with_backend(Box::new(backend.clone()), &config).unwrap();

            assert!(store.records().is_empty());
            let rewritten = backend.data().unwrap();
            assert_ne!(rewritten, b"\x00\x01 garbage \xff".to_vec());
            // The fresh file is readable with the same key.
            assert!(store.try_load().unwrap().is_empty());
            assert!(store.load().is_empty());
        }
    }

    #[test]
    fn plaintext_roundtrip() {
        let config = config(EncryptionMode::None);
        let (backend, mut store) = memory_store(&config);
        let records = vec![user("1", "ann"), user("2", "eve")];
        store.save(records.clone()).unwrap();

        let text = String::from_utf8(backend.data().unwrap()).unwrap();
        assert!(text.contains("\"name\": \"ann\""));

        let mut reopened = Store::with_backend(Box::new(backend), &config).unwrap();
        assert_eq!(reopened.load(), records);
    }

    #[test]
    fn whole_mode_roundtrip() {
        let config = config(EncryptionMode::Whole);
        let (backend, mut store) = memory_store(&config);
        let records = vec![user("1", "ann")];
        store.save(records.clone()).unwrap();

        let text = String::from_utf8(backend.data().unwrap()).unwrap();
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!text.contains("ann"));

        let reopened = Store::with_backend(Box::new(backend), &config).unwrap();
        assert_eq!(reopened.records(), records.as_slice());
    }

    #[test]
    fn per_field_mode_roundtrip() {
        let config = config(EncryptionMode::PerField);
        let (backend, mut store) = memory_store(&config);
        let records = vec![user("1", "ann")];
        store.save(records.clone()).unwrap();

        let stored = decode_records(&backend.data().unwrap()).unwrap();
        assert_eq!(stored[0].id().as_deref(), Some("1"));
        assert_eq!(stored[0].get("age"), Some(&jsondb_codec::Value::from(30)));
        assert_ne!(stored[0].get("name"), Some(&jsondb_codec::Value::from("ann")));

        let reopened = Store::with_backend(Box::new(backend), &config).unwrap();
        assert_eq!(reopened.records(), records.as_slice());
    }

    #[test]
    fn whole_mode_blank_plaintext_counts_as_empty() {
        let config = config(EncryptionMode::Whole);
        let cipher = Cipher::new(config.secret_key.as_ref().unwrap());
        let blob = cipher.encrypt_hex(b"   ").unwrap();
        let backend = InMemoryBackend::with_data(blob.clone().into_bytes());

        let store = Store::with_backend(Box::new(backend.clone()), &config).unwrap();
        assert!(store.records().is_empty());
        assert_ne!(backend.data(), Some(blob.into_bytes()));
    }

    #[test]
    fn wrong_key_reinitializes_but_try_load_reports() {
        let first = config(EncryptionMode::Whole);
        let (backend, mut store) = memory_store(&first);
        store.save(vec![user("1", "ann")]).unwrap();

        let second = config(EncryptionMode::Whole);
        let mut strict = Store::detached(Box::new(backend.clone()), &second).unwrap();
        assert!(matches!(
            strict.try_load(),
            Err(CoreError::DecryptionFailed { .. })
        ));

        assert!(strict.load().is_empty());
        assert!(strict.try_load().unwrap().is_empty());
    }

    #[test]
    fn missing_key_is_rejected() {
        let config = Config::new().encryption(EncryptionMode::PerField);
        let result = Store::with_backend(Box::new(InMemoryBackend::new()), &config);
        assert!(matches!(result, Err(CoreError::MissingKey { mode: "per-field" })));
    }

    #[test]
    fn read_error_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        // Reading a directory fails with something other than NotFound.
        let path = dir.path().join("users.jsondb");
        std::fs::create_dir(&path).unwrap();

        let mut store = Store::open(&path, &config(EncryptionMode::None)).unwrap();
        assert!(store.load().is_empty());
        assert!(path.is_dir());
        assert!(matches!(store.try_load(), Err(CoreError::Storage(_))));
    }

    #[test]
    fn save_failure_keeps_records_in_memory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.jsondb");
        std::fs::create_dir(&path).unwrap();

        let mut store = Store::open(&path, &config(EncryptionMode::None)).unwrap();
        assert!(store.save(vec![user("1", "ann")]).is_err());
        assert_eq!(store.records().len(), 1);
    }

    #[test]
    fn detached_store_leaves_file_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.jsondb");
        std::fs::write(&path, "{broken").unwrap();

        let store = Store::open_detached(&path, &config(EncryptionMode::None)).unwrap();
        assert!(matches!(store.try_load(), Err(CoreError::Corruption { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{broken");

        let missing = Store::open_detached(&dir.path().join("absent.jsondb"), &Config::new())
            .unwrap();
        assert!(matches!(missing.try_load(), Err(CoreError::Storage(ref e)) if e.is_not_found()));
        assert!(!dir.path().join("absent.jsondb").exists());
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("users.jsondb");
        let config = config(EncryptionMode::PerField);

        let mut store = Store::open(&path, &config).unwrap();
        assert!(path.exists());
        store.save(vec![user("1", "ann")]).unwrap();
        assert!(store.size().unwrap() > 0);

        let reopened = Store::open(&path, &config).unwrap();
        assert_eq!(reopened.records(), &[user("1", "ann")]);
    }
}
