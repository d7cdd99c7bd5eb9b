//! Cryptographic operations for JsonDB.
//!
//! This module provides encryption at rest for collection files.
//!
//! ## Security Model
//!
//! - AES-256-GCM with a fresh random 16-byte IV per encryption
//! - Blob layout: `iv (16 bytes) || ciphertext || tag (16 bytes)`, hex-encoded
//!   when stored in a file or a field
//! - Keys are zeroized on drop and redacted from `Debug` output
//! - A key, once persisted, must be reused for every later read
//!
//! ## Usage
//!
//! ```
//! use jsondb_core::crypto::{Cipher, SecretKey};
//!
//! let key = SecretKey::generate();
//! let cipher = Cipher::new(&key);
//!
//! let blob = cipher.encrypt(b"secret data").unwrap();
//! assert_eq!(cipher.decrypt(&blob).unwrap(), b"secret data");
//! ```

mod cipher;
mod fields;
mod key;

pub use cipher::{Cipher, IV_SIZE, TAG_SIZE};
pub use fields::FieldCodec;
pub use key::{KeyManager, SecretKey, KEY_SIZE};
