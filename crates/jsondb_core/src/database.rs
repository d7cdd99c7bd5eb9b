//! Database facade: a directory of collections sharing one configuration.

use crate::collection::Collection;
use crate::config::{Config, ConfigFile};
use crate::error::{Code, CoreError, CoreResult};
use crate::schema::{FieldSpec, Schema};
use crate::store::Store;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Name of the settings file inside a database directory.
pub const CONFIG_FILE: &str = "jsondb.json";

/// Extension of collection files.
pub const COLLECTION_EXTENSION: &str = "jsondb";

/// A directory holding one file per collection.
///
/// The encryption mode and key are resolved once, when the database is
/// opened, and shared by every collection opened through it.
///
/// ```
/// use jsondb_core::{Config, Database, FieldSpec, Record};
///
/// let dir = tempfile::tempdir()?;
/// let db = Database::open_with_config(dir.path(), Config::new())?;
/// let users = db.collection("users", [("name", FieldSpec::string().required())])?;
///
/// users.create(Record::new().with("name", "ann"))?;
/// assert!(dir.path().join("users.jsondb").exists());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    dir: PathBuf,
    config: Config,
}

impl Database {
    /// Opens the database in `dir`, creating the directory if needed.
    ///
    /// Settings come from `dir/jsondb.json`. When they call for encryption
    /// and hold no key, one is generated and written there.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a configured
    /// key is malformed.
    pub fn open(dir: &Path) -> CoreResult<Self> {
        Self::open_inner(dir, None)
    }

    /// Opens the database with an explicit hex key, overriding the
    /// configured one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the key is
    /// malformed.
    pub fn open_with_key(dir: &Path, key: &str) -> CoreResult<Self> {
        Self::open_inner(dir, Some(key))
    }

    fn open_inner(dir: &Path, key: Option<&str>) -> CoreResult<Self> {
        fs::create_dir_all(dir)?;
        let mut file = ConfigFile::load(&dir.join(CONFIG_FILE));
        let config = Config::from_config_file(&mut file, key)?;
        info!(
            dir = %dir.display(),
            mode = %config.encryption,
            "database opened"
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            config,
        })
    }

    /// Opens the database with an explicit configuration. The settings
    /// file is not read.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_config(dir: &Path, config: Config) -> CoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            config,
        })
    }

    /// The database directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the file backing collection `name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for names that are empty, start with a
    /// dot, or contain characters other than ASCII letters, digits, `_`,
    /// `-`, and `.`.
    pub fn collection_path(&self, name: &str) -> CoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{COLLECTION_EXTENSION}")))
    }

    /// Opens the store backing collection `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name.
    pub fn store(&self, name: &str) -> CoreResult<Store> {
        Store::open(&self.collection_path(name)?, &self.config)
    }

    /// Opens the store backing collection `name` without reading or
    /// writing its file. See [`Store::open_detached`].
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name.
    pub fn detached_store(&self, name: &str) -> CoreResult<Store> {
        Store::open_detached(&self.collection_path(name)?, &self.config)
    }

    /// Opens collection `name` with field rules merged from `rules`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or schema.
    pub fn collection<I, S>(&self, name: &str, rules: I) -> CoreResult<Collection>
    where
        I: IntoIterator<Item = (S, FieldSpec)>,
        S: Into<String>,
    {
        let schema = Schema::merge(rules).inspect_err(|e| {
            error!(code = %e.code(), collection = name, error = %e, "invalid schema");
        })?;
        self.collection_with_schema(name, schema)
    }

    /// Opens collection `name` with an already-built schema.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name.
    pub fn collection_with_schema(&self, name: &str, schema: Schema) -> CoreResult<Collection> {
        let store = self.store(name)?;
        Ok(Collection::with_schema(name, store, schema))
    }

    /// Names of the collections with a file in the directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn collection_names(&self) -> CoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(COLLECTION_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

fn validate_name(name: &str) -> CoreResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        let e = CoreError::invalid_operation(format!("invalid collection name '{name}'"));
        error!(code = %Code::InvalidOperation, error = %e, "rejected collection name");
        Err(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncryptionMode;
    use jsondb_codec::{Record, Value};
    use tempfile::tempdir;

    #[test]
    fn open_defaults_to_whole_mode_and_persists_key() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.config().encryption, EncryptionMode::Whole);
        assert!(dir.path().join(CONFIG_FILE).exists());

        let again = Database::open(dir.path()).unwrap();
        assert_eq!(db.config().secret_key, again.config().secret_key);
    }

    #[test]
    fn encrypted_collection_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let db = Database::open(dir.path()).unwrap();
            let users = db.collection("users", [("name", FieldSpec::string())]).unwrap();
            users.create(Record::new().with("name", "ann")).unwrap();
        }

        let text = fs::read_to_string(dir.path().join("users.jsondb")).unwrap();
        assert!(!text.contains("ann"));

        let db = Database::open(dir.path()).unwrap();
        let users = db.collection("users", [("name", FieldSpec::string())]).unwrap();
        assert_eq!(
            users.find_by_id("1").unwrap().get("name"),
            Some(&Value::from("ann"))
        );
    }

    #[test]
    fn plaintext_settings() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"db":{"encrypt":false}}"#).unwrap();

        let db = Database::open(dir.path()).unwrap();
        let notes = db.collection_with_schema("notes", Schema::empty()).unwrap();
        notes.create(Record::new().with("text", "hi")).unwrap();

        let text = fs::read_to_string(dir.path().join("notes.jsondb")).unwrap();
        assert!(text.contains("\"text\": \"hi\""));
    }

    #[test]
    fn explicit_key_overrides() {
        let dir = tempdir().unwrap();
        let key = crate::crypto::SecretKey::generate();
        let db = Database::open_with_key(dir.path(), &key.to_hex()).unwrap();
        assert_eq!(db.config().secret_key.as_ref(), Some(&key));
        assert!(!dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn invalid_names() {
        let dir = tempdir().unwrap();
        let db = Database::open_with_config(dir.path(), Config::new()).unwrap();
        for name in ["", "../etc", ".hidden", "a/b", "sp ace"] {
            assert!(matches!(
                db.collection_path(name),
                Err(CoreError::InvalidOperation { .. })
            ));
        }
        assert!(db.collection_path("user_v2.archive").is_ok());
    }

    #[test]
    fn schema_errors_are_fatal() {
        let dir = tempdir().unwrap();
        let db = Database::open_with_config(dir.path(), Config::new()).unwrap();
        let rules = (0..11).map(|i| (format!("f{i}"), FieldSpec::string()));
        assert!(matches!(
            db.collection("wide", rules),
            Err(CoreError::SchemaTooLarge { .. })
        ));
    }

    #[test]
    fn lists_collection_names() {
        let dir = tempdir().unwrap();
        let db = Database::open_with_config(dir.path(), Config::new()).unwrap();
        db.collection_with_schema("users", Schema::empty()).unwrap();
        db.collection_with_schema("notes", Schema::empty()).unwrap();
        fs::write(dir.path().join("readme.txt"), "x").unwrap();

        assert_eq!(db.collection_names().unwrap(), ["notes", "users"]);
    }
}
