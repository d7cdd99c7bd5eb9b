//! Error types and stable log codes for JsonDB core.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Stable codes attached to every log line and error.
///
/// The string form (`E001`, `N001`, ...) is part of the operational
/// surface and never changes meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// Data file missing, initial file created.
    FileMissing,
    /// Data file empty, initial file rewritten.
    FileEmpty,
    /// Data file unparsable, reinitialized.
    FileCorrupt,
    /// Other read error; file left untouched.
    ReadFailed,
    /// Save failed; in-memory collection kept.
    SaveFailed,
    /// Configuration file missing, defaults used.
    ConfigMissing,
    /// Configuration file unreadable or malformed, defaults used.
    ConfigUnreadable,
    /// Configuration file unwritable, generated key not persisted.
    ConfigUnwritable,
    /// Initial data file could not be written.
    InitFailed,
    /// Decryption failed.
    DecryptionFailed,
    /// Record not found.
    NotFound,
    /// Duplicate id on create.
    DuplicateId,
    /// Record validation failed.
    ValidationFailed,
    /// Schema exceeds the field cap.
    TooManyFields,
    /// Invalid schema definition.
    InvalidSchema,
    /// Encryption failed, or key missing or invalid.
    EncryptionFailed,
    /// Codec error outside of load recovery.
    CodecFailed,
    /// Operation rejected before touching storage.
    InvalidOperation,
    /// Record created.
    Created,
    /// Record updated.
    Updated,
    /// Record deleted.
    Deleted,
    /// Records listed.
    Listed,
}

impl Code {
    /// The stable string form of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Code::FileMissing => "E001",
            Code::FileEmpty => "E002",
            Code::FileCorrupt => "E003",
            Code::ReadFailed => "E004",
            Code::SaveFailed => "E005",
            Code::ConfigMissing => "E006",
            Code::ConfigUnreadable => "E007",
            Code::ConfigUnwritable => "E008",
            Code::InitFailed => "E009",
            Code::DecryptionFailed => "E010",
            Code::NotFound => "E011",
            Code::DuplicateId => "E012",
            Code::ValidationFailed => "E013",
            Code::TooManyFields => "E014",
            Code::InvalidSchema => "E015",
            Code::EncryptionFailed => "E016",
            Code::CodecFailed => "E017",
            Code::InvalidOperation => "E018",
            Code::Created => "N001",
            Code::Updated => "N002",
            Code::Deleted => "N003",
            Code::Listed => "N004",
        }
    }

    /// Returns `true` for informational (`N`) codes.
    #[must_use]
    pub const fn is_notice(self) -> bool {
        matches!(
            self,
            Code::Created | Code::Updated | Code::Deleted | Code::Listed
        )
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in JsonDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] jsondb_storage::StorageError),

    /// JSON codec error.
    #[error("codec error: {0}")]
    Codec(#[from] jsondb_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored content could not be parsed as a collection document.
    #[error("corrupted collection file: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed (key mismatch or malformed blob).
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// A secret key could not be parsed.
    #[error("invalid secret key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },

    /// An encrypting mode was configured without a key.
    #[error("encryption mode {mode} requires a secret key")]
    MissingKey {
        /// The configured mode.
        mode: &'static str,
    },

    /// A record failed schema validation.
    #[error("validation failed on field '{field}': {reason}")]
    ValidationFailed {
        /// The first field that failed.
        field: String,
        /// Why it failed.
        reason: String,
    },

    /// A record with the same id already exists.
    #[error("record already exists: id {id}")]
    DuplicateId {
        /// The conflicting id.
        id: String,
    },

    /// No record with the given id.
    #[error("record not found: id {id}")]
    NotFound {
        /// The id that was searched.
        id: String,
    },

    /// Schema declares more fields than allowed.
    #[error("schema declares {count} fields, maximum is {max}")]
    SchemaTooLarge {
        /// Number of declared fields.
        count: usize,
        /// The cap.
        max: usize,
    },

    /// Field declares an unsupported type.
    #[error("invalid field type '{type_name}' for field '{field}'")]
    InvalidFieldType {
        /// The field.
        field: String,
        /// The declared type.
        type_name: String,
    },

    /// Field declares a pattern that does not compile.
    #[error("invalid regex for field '{field}': {message}")]
    InvalidRegex {
        /// The field.
        field: String,
        /// Compiler message.
        message: String,
    },

    /// Field declares a default of the wrong type.
    #[error("default for field '{field}' must be a {expected}")]
    InvalidDefault {
        /// The field.
        field: String,
        /// The declared field type.
        expected: &'static str,
    },

    /// Configuration could not be read or written.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a validation error for `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a duplicate id error.
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// The stable code for this error.
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::Storage(e) if e.is_not_found() => Code::FileMissing,
            Self::Storage(_) | Self::Io(_) => Code::ReadFailed,
            Self::Codec(_) => Code::CodecFailed,
            Self::Corruption { .. } => Code::FileCorrupt,
            Self::EncryptionFailed { .. } | Self::InvalidKey { .. } | Self::MissingKey { .. } => {
                Code::EncryptionFailed
            }
            Self::DecryptionFailed { .. } => Code::DecryptionFailed,
            Self::ValidationFailed { .. } => Code::ValidationFailed,
            Self::DuplicateId { .. } => Code::DuplicateId,
            Self::NotFound { .. } => Code::NotFound,
            Self::SchemaTooLarge { .. } => Code::TooManyFields,
            Self::InvalidFieldType { .. }
            | Self::InvalidRegex { .. }
            | Self::InvalidDefault { .. } => Code::InvalidSchema,
            Self::Config { .. } => Code::ConfigUnreadable,
            Self::InvalidOperation { .. } => Code::InvalidOperation,
        }
    }
}
