//! Test fixtures and collection helpers.
//!
//! Provides convenience functions for setting up test collections
//! and common test scenarios.

use jsondb_core::{Collection, Config, Database, EncryptionMode, FieldSpec, Schema, SecretKey, Store};
use jsondb_storage::InMemoryBackend;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name used for fixture collections.
pub const TEST_COLLECTION: &str = "users";

/// A schema shaped like a typical user table.
///
/// - `name`: required, unique, 6-12 word characters
/// - `password`: required, 8-16 characters from a restricted set
/// - `avatarURL`: optional http(s) or data URL with a default
/// - `is2FAEnabled`: optional boolean, default `false`
pub fn user_schema() -> Schema {
    Schema::merge([
        (
            "name",
            FieldSpec::string().required().regex("[a-zA-Z0-9_]{6,12}").unique(),
        ),
        (
            "password",
            FieldSpec::string().required().regex("[a-zA-Z0-9.,@$!%*?&]{8,16}"),
        ),
        (
            "avatarURL",
            FieldSpec::string()
                .regex(r"(https?)://[^\s/$.?#].[^\s]*|data:image/(png|jpeg|jpg|gif);base64,[A-Za-z0-9+/=]+")
                .default_value("https://www.example.com/user.png"),
        ),
        ("is2FAEnabled", FieldSpec::boolean().default_value(false)),
    ])
    .expect("user schema is valid")
}

/// Returns a config for `mode`, with a fresh key when the mode needs one.
pub fn config_for(mode: EncryptionMode) -> Config {
    let config = Config::new().encryption(mode).sync_on_write(false);
    if mode.requires_key() {
        config.secret_key(SecretKey::generate())
    } else {
        config
    }
}

/// A test collection with automatic cleanup.
pub struct TestCollection {
    /// The collection.
    pub collection: Collection,
    /// Handle to the in-memory document, if memory-backed.
    pub backend: Option<InMemoryBackend>,
    /// The config the collection was opened with.
    pub config: Config,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestCollection {
    /// Creates a plaintext in-memory collection.
    pub fn memory(schema: Schema) -> Self {
        Self::memory_with(config_for(EncryptionMode::None), schema)
    }

    /// Creates an in-memory collection with `config`.
    pub fn memory_with(config: Config, schema: Schema) -> Self {
        let backend = InMemoryBackend::new();
        let store = Store::with_backend(Box::new(backend.clone()), &config)
            .expect("Failed to open in-memory store");
        Self {
            collection: Collection::with_schema(TEST_COLLECTION, store, schema),
            backend: Some(backend),
            config,
            temp_dir: None,
        }
    }

    /// Creates a file-backed collection in a temporary directory.
    pub fn file(config: Config, schema: Schema) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(format!("{TEST_COLLECTION}.jsondb"));
        let store = Store::open(&path, &config).expect("Failed to open file store");
        Self {
            collection: Collection::with_schema(TEST_COLLECTION, store, schema),
            backend: None,
            config,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the collection file path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir
            .as_ref()
            .map(|d| d.path().join(format!("{TEST_COLLECTION}.jsondb")))
    }

    /// Opens a second, independent collection over the same document with
    /// the same config, as a restarted process would.
    pub fn reopen(&self, schema: Schema) -> Collection {
        let store = match (&self.backend, self.path()) {
            (Some(backend), _) => Store::with_backend(Box::new(backend.clone()), &self.config),
            (None, Some(path)) => Store::open(&path, &self.config),
            (None, None) => unreachable!("fixture has either a backend or a path"),
        }
        .expect("Failed to reopen store");
        Collection::with_schema(TEST_COLLECTION, store, schema)
    }

    /// Replaces the raw document, bypassing the store.
    pub fn overwrite_raw(&self, bytes: &[u8]) {
        match (&self.backend, self.path()) {
            (Some(backend), _) => backend.set_data(bytes.to_vec()),
            (None, Some(path)) => std::fs::write(path, bytes).expect("Failed to overwrite file"),
            (None, None) => unreachable!("fixture has either a backend or a path"),
        }
    }

    /// Reads the raw document, bypassing the store.
    pub fn raw(&self) -> Option<Vec<u8>> {
        match (&self.backend, self.path()) {
            (Some(backend), _) => backend.data(),
            (None, Some(path)) => std::fs::read(path).ok(),
            (None, None) => None,
        }
    }
}

impl std::ops::Deref for TestCollection {
    type Target = Collection;

    fn deref(&self) -> &Self::Target {
        &self.collection
    }
}

/// Runs a test with a database in a temporary directory.
///
/// # Example
///
/// ```rust
/// use jsondb_testkit::with_temp_db;
/// use jsondb_core::{Record, Schema};
///
/// with_temp_db(|db, _dir| {
///     let notes = db.collection_with_schema("notes", Schema::empty()).unwrap();
///     notes.create(Record::new().with("text", "hi")).unwrap();
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db = Database::open(temp_dir.path()).expect("Failed to open database");
    f(&db, temp_dir.path())
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use jsondb_core::Record;

    /// A valid user record with a name derived from `index`.
    pub fn user(index: usize) -> Record {
        Record::new()
            .with("name", format!("user_{index:06}"))
            .with("password", "s3cret.pass")
    }

    /// Creates a collection with `count` valid users.
    pub fn populated_collection(count: usize) -> TestCollection {
        let fixture = TestCollection::memory(user_schema());
        for i in 0..count {
            fixture.create(user(i)).expect("Failed to create user");
        }
        fixture
    }
}
