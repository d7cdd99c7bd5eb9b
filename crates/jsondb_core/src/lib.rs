//! # JsonDB Core
//!
//! A file-backed document store: one file per collection of
//! schema-validated JSON records, optionally encrypted as a whole or field
//! by field.
//!
//! This crate provides:
//! - Key resolution and AES-256-GCM encryption ([`crypto`])
//! - Settings and explicit store configuration ([`Config`], [`ConfigFile`])
//! - A self-healing whole-file [`Store`]
//! - Field rules ([`Schema`]) and the CRUD [`Collection`] engine
//! - A [`Database`] facade over a directory of collections
//!
//! Every log line carries a stable [`Code`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
pub mod crypto;
mod database;
mod error;
mod schema;
mod store;

pub use collection::{validate, Collection};
pub use config::{Config, ConfigFile, DbSettings, EncryptionMethod, EncryptionMode};
pub use crypto::{Cipher, FieldCodec, KeyManager, SecretKey};
pub use database::{Database, COLLECTION_EXTENSION, CONFIG_FILE};
pub use error::{Code, CoreError, CoreResult};
pub use jsondb_codec::{Record, Value, ID_FIELD};
pub use schema::{FieldRule, FieldSpec, FieldType, LengthBounds, Schema, MAX_FIELDS};
pub use store::Store;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
