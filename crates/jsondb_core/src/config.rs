//! Collection configuration.
//!
//! Two layers:
//! - [`ConfigFile`]: the on-disk `{"db": {...}}` settings document shared by
//!   every collection of a process, which also stores the generated key
//! - [`Config`]: the resolved, explicit configuration handed to a
//!   [`Store`](crate::Store). Nothing is read from ambient process state.

use crate::crypto::{KeyManager, SecretKey};
use crate::error::{Code, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// How a collection file is protected at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    /// Plaintext JSON array.
    None,
    /// The serialized array is one hex-encoded ciphertext blob.
    Whole,
    /// The array stays JSON; every non-`id` string leaf is a blob.
    PerField,
}

impl EncryptionMode {
    /// Derives the mode from the `encrypt` flag and the method.
    #[must_use]
    pub fn from_settings(encrypt: bool, method: EncryptionMethod) -> Self {
        match (encrypt, method) {
            (false, _) => EncryptionMode::None,
            (true, EncryptionMethod::Whole) => EncryptionMode::Whole,
            (true, EncryptionMethod::PerField) => EncryptionMode::PerField,
        }
    }

    /// Returns `true` if this mode needs a secret key.
    #[must_use]
    pub const fn requires_key(self) -> bool {
        !matches!(self, EncryptionMode::None)
    }

    /// Short name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EncryptionMode::None => "none",
            EncryptionMode::Whole => "whole",
            EncryptionMode::PerField => "per-field",
        }
    }
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(EncryptionMode::None),
            "whole" => Ok(EncryptionMode::Whole),
            "per-field" => Ok(EncryptionMode::PerField),
            other => Err(CoreError::config(format!(
                "unknown encryption mode '{other}'"
            ))),
        }
    }
}

/// Encryption method as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionMethod {
    /// Encrypt the whole serialized collection.
    #[default]
    Whole,
    /// Encrypt string fields individually.
    PerField,
}

/// The `db` section of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    /// Whether collection files are encrypted.
    pub encrypt: bool,
    /// Which encryption layout to use when `encrypt` is set.
    pub encryption_method: EncryptionMethod,
    /// Hex-encoded 256-bit key; generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            encrypt: true,
            encryption_method: EncryptionMethod::Whole,
            secret_key: None,
        }
    }
}

impl DbSettings {
    /// The effective encryption mode.
    #[must_use]
    pub fn mode(&self) -> EncryptionMode {
        EncryptionMode::from_settings(self.encrypt, self.encryption_method)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    db: DbSettings,
}

/// The settings file, read once at startup.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    settings: DbSettings,
}

impl ConfigFile {
    /// Loads settings from `path`.
    ///
    /// Never fails: a missing file or one that cannot be read or parsed
    /// yields the defaults (encryption on, whole-file mode) and is logged.
    pub fn load(path: &Path) -> Self {
        let settings = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<SettingsDocument>(&text) {
                Ok(doc) => doc.db,
                Err(e) => {
                    warn!(
                        code = %Code::ConfigUnreadable,
                        path = %path.display(),
                        error = %e,
                        "configuration is malformed, using defaults"
                    );
                    DbSettings::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    code = %Code::ConfigMissing,
                    path = %path.display(),
                    "configuration file not found, using defaults"
                );
                DbSettings::default()
            }
            Err(e) => {
                warn!(
                    code = %Code::ConfigUnreadable,
                    path = %path.display(),
                    error = %e,
                    "configuration is unreadable, using defaults"
                );
                DbSettings::default()
            }
        };

        Self {
            path: path.to_path_buf(),
            settings,
        }
    }

    /// Creates a file handle with explicit settings (nothing is read).
    #[must_use]
    pub fn with_settings(path: &Path, settings: DbSettings) -> Self {
        Self {
            path: path.to_path_buf(),
            settings,
        }
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded settings.
    #[must_use]
    pub fn settings(&self) -> &DbSettings {
        &self.settings
    }

    /// The effective encryption mode.
    #[must_use]
    pub fn mode(&self) -> EncryptionMode {
        self.settings.mode()
    }

    /// Writes `key` into the `db.secret_key` entry of the file.
    ///
    /// Other entries and sections already in the file are preserved. An
    /// existing file that does not parse is left alone and reported as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or written.
    pub fn persist_secret_key(&mut self, key: &SecretKey) -> CoreResult<()> {
        let mut document = match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str::<serde_json::Value>(&text)
                .map_err(|e| CoreError::config(format!("cannot update settings: {e}")))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => serde_json::json!({}),
            Err(e) => return Err(e.into()),
        };

        let root = document
            .as_object_mut()
            .ok_or_else(|| CoreError::config("settings root is not an object"))?;
        let db = root
            .entry("db")
            .or_insert_with(|| serde_json::json!({}))
            .as_object_mut()
            .ok_or_else(|| CoreError::config("'db' section is not an object"))?;
        db.insert(
            "secret_key".to_string(),
            serde_json::Value::String(key.to_hex()),
        );

        let text = serde_json::to_string_pretty(&document)
            .map_err(|e| CoreError::config(e.to_string()))?;
        fs::write(&self.path, text)?;

        self.settings.secret_key = Some(key.to_hex());
        Ok(())
    }
}

/// Resolved configuration for a store.
///
/// Built explicitly and passed to constructors, so several independently
/// keyed collections can live in one process.
///
/// # Example
///
/// ```
/// use jsondb_core::{Config, EncryptionMode, SecretKey};
///
/// let config = Config::new()
///     .encryption(EncryptionMode::PerField)
///     .secret_key(SecretKey::generate())
///     .sync_on_write(false);
/// assert_eq!(config.encryption, EncryptionMode::PerField);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Encryption layout of the collection file.
    pub encryption: EncryptionMode,

    /// Key for `Whole` and `PerField` modes.
    pub secret_key: Option<SecretKey>,

    /// Whether to `fsync` after every save (safer but slower).
    pub sync_on_write: bool,

    /// Whether plaintext and whole-mode output is indented JSON.
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encryption: EncryptionMode::None,
            secret_key: None,
            sync_on_write: true,
            pretty: true,
        }
    }
}

impl Config {
    /// Creates a plaintext configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a configuration from a settings file.
    ///
    /// The mode comes from the file (default: whole-file encryption). When
    /// the mode encrypts, the key is resolved by [`KeyManager`], which may
    /// generate one and write it back to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if a supplied or configured key is malformed.
    pub fn from_file(path: &Path, explicit_key: Option<&str>) -> CoreResult<Self> {
        let mut file = ConfigFile::load(path);
        Self::from_config_file(&mut file, explicit_key)
    }

    /// Resolves a configuration from already-loaded settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a supplied or configured key is malformed.
    pub fn from_config_file(file: &mut ConfigFile, explicit_key: Option<&str>) -> CoreResult<Self> {
        let encryption = file.mode();
        let secret_key = if encryption.requires_key() {
            Some(KeyManager::new(file).resolve(explicit_key)?)
        } else {
            explicit_key.map(SecretKey::from_hex).transpose()?
        };

        Ok(Self {
            encryption,
            secret_key,
            ..Self::default()
        })
    }

    /// Sets the encryption mode.
    #[must_use]
    pub fn encryption(mut self, mode: EncryptionMode) -> Self {
        self.encryption = mode;
        self
    }

    /// Sets the secret key.
    #[must_use]
    pub fn secret_key(mut self, key: SecretKey) -> Self {
        self.secret_key = Some(key);
        self
    }

    /// Sets whether to sync after every save.
    #[must_use]
    pub fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets whether output is indented.
    #[must_use]
    pub fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }
}
