//! Secret key material and key resolution.

use crate::config::ConfigFile;
use crate::error::{Code, CoreError, CoreResult};
use rand::RngCore;
use tracing::{error, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// A 256-bit symmetric key.
///
/// The key is automatically zeroized when dropped. It is hex-encoded in
/// configuration.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Generates a new random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CoreError::invalid_key(format!(
                "expected {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Parses a 64-character hex string.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid hex or a wrong length.
    pub fn from_hex(text: &str) -> CoreResult<Self> {
        let mut decoded = hex::decode(text.trim())
            .map_err(|e| CoreError::invalid_key(format!("not hex: {e}")))?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    /// Hex form, as stored in configuration.
    ///
    /// # Security
    ///
    /// Be careful with this method - don't log the result.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Returns the key as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Resolves the secret key for a process from explicit input or
/// configuration, generating and persisting one when neither has it.
#[derive(Debug)]
pub struct KeyManager<'a> {
    config: &'a mut ConfigFile,
}

impl<'a> KeyManager<'a> {
    /// Creates a key manager over a loaded configuration file.
    pub fn new(config: &'a mut ConfigFile) -> Self {
        Self { config }
    }

    /// Resolves the key.
    ///
    /// Order: `explicit`, then the key in configuration, then a freshly
    /// generated key. A generated key is written back to the configuration
    /// file; if that write fails the failure is logged and the key is still
    /// returned for use by this process. Files written with it become
    /// unreadable after a restart unless a later write succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit or configured key is not valid hex of
    /// the right length.
    pub fn resolve(&mut self, explicit: Option<&str>) -> CoreResult<SecretKey> {
        if let Some(text) = explicit {
            return SecretKey::from_hex(text);
        }
        if let Some(text) = self.config.settings().secret_key.as_deref() {
            return SecretKey::from_hex(text);
        }

        let key = SecretKey::generate();
        match self.config.persist_secret_key(&key) {
            Ok(()) => info!(
                path = %self.config.path().display(),
                "generated secret key and saved it to configuration"
            ),
            Err(e) => error!(
                code = %Code::ConfigUnwritable,
                path = %self.config.path().display(),
                error = %e,
                "configuration is not writable, generated key is not persisted"
            ),
        }
        Ok(key)
    }
}
