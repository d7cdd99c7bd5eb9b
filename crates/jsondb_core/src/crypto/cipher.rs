//! Authenticated symmetric encryption of opaque payloads.

use crate::crypto::key::SecretKey;
use crate::error::{CoreError, CoreResult};
use aes_gcm::{
    aead::{consts::U16, generic_array::GenericArray, Aead, KeyInit},
    aes::Aes256,
    AesGcm,
};
use rand::RngCore;

/// Size of the per-message initialization vector in bytes.
pub const IV_SIZE: usize = 16;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// AES-256-GCM with a 16-byte IV.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypts and decrypts byte payloads with one key.
///
/// Stateless apart from the key schedule, so a `Cipher` can be shared
/// freely between threads.
pub struct Cipher {
    cipher: Aes256Gcm16,
}

impl Cipher {
    /// Creates a cipher for the given key.
    #[must_use]
    pub fn new(key: &SecretKey) -> Self {
        // SecretKey is always exactly 32 bytes, the AES-256 key size.
        let cipher = Aes256Gcm16::new(GenericArray::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypts `plaintext` under a fresh random IV.
    ///
    /// The output format is: `iv (16 bytes) || ciphertext || tag (16 bytes)`
    pub fn encrypt(&self, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = self
            .cipher
            .encrypt(GenericArray::from_slice(&iv), plaintext)
            .map_err(|_| CoreError::encryption_failed("encryption error"))?;

        let mut blob = Vec::with_capacity(IV_SIZE + ciphertext.len());
        blob.extend_from_slice(&iv);
        blob.extend(ciphertext);
        Ok(blob)
    }

    /// Decrypts a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` if the blob is too short, was produced
    /// under another key, or was altered.
    pub fn decrypt(&self, blob: &[u8]) -> CoreResult<Vec<u8>> {
        if blob.len() < IV_SIZE + TAG_SIZE {
            return Err(CoreError::decryption_failed("ciphertext too short"));
        }

        let (iv, ciphertext) = blob.split_at(IV_SIZE);
        self.cipher
            .decrypt(GenericArray::from_slice(iv), ciphertext)
            .map_err(|_| CoreError::decryption_failed("authentication failed"))
    }

    /// Encrypts and hex-encodes, the form stored in files and fields.
    pub fn encrypt_hex(&self, plaintext: &[u8]) -> CoreResult<String> {
        self.encrypt(plaintext).map(hex::encode)
    }

    /// Hex-decodes and decrypts.
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` for malformed hex as well as for
    /// authentication failures.
    pub fn decrypt_hex(&self, text: &str) -> CoreResult<Vec<u8>> {
        let blob = hex::decode(text)
            .map_err(|e| CoreError::decryption_failed(format!("malformed blob: {e}")))?;
        self.decrypt(&blob)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("cipher", &"Aes256Gcm/iv16")
            .finish()
    }
}
