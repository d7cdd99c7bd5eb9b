//! CLI command implementations.

pub mod inspect;
pub mod keygen;
pub mod records;
pub mod verify;

use jsondb_core::{Collection, Database, Schema};
use std::fs;
use std::path::{Path, PathBuf};

/// Result type shared by commands.
pub type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;

/// The collection a command operates on.
#[derive(Debug, Clone)]
pub struct Target {
    /// Database directory.
    pub dir: PathBuf,
    /// Explicit hex key.
    pub key: Option<String>,
    /// Collection name.
    pub name: String,
    /// Schema file.
    pub schema: Option<PathBuf>,
}

impl Target {
    /// Opens the database, resolving mode and key.
    pub fn database(&self) -> CommandResult<Database> {
        open_database(&self.dir, self.key.as_deref())
    }

    /// Opens the collection with its schema, if one was given.
    pub fn collection(&self) -> CommandResult<Collection> {
        let schema = match &self.schema {
            Some(path) => load_schema(path)?,
            None => Schema::empty(),
        };
        Ok(self.database()?.collection_with_schema(&self.name, schema)?)
    }
}

/// Opens a database with an optional explicit key.
pub fn open_database(dir: &Path, key: Option<&str>) -> CommandResult<Database> {
    tracing::debug!(dir = %dir.display(), explicit_key = key.is_some(), "Opening database");
    let db = match key {
        Some(key) => Database::open_with_key(dir, key)?,
        None => Database::open(dir)?,
    };
    Ok(db)
}

fn load_schema(path: &Path) -> CommandResult<Schema> {
    tracing::debug!(path = %path.display(), "Loading schema");
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read schema {}: {e}", path.display()))?;
    Ok(Schema::from_json(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn schema_file_is_applied() {
        let dir = tempdir().unwrap();
        let schema_path = dir.path().join("users.schema.json");
        fs::write(&schema_path, r#"{"name": {"required": true}}"#).unwrap();

        let target = Target {
            dir: dir.path().join("db"),
            key: None,
            name: "users".to_string(),
            schema: Some(schema_path),
        };
        let users = target.collection().unwrap();
        assert_eq!(users.schema().len(), 1);
    }

    #[test]
    fn missing_schema_file_is_an_error() {
        let dir = tempdir().unwrap();
        let target = Target {
            dir: dir.path().to_path_buf(),
            key: None,
            name: "users".to_string(),
            schema: Some(dir.path().join("absent.json")),
        };
        assert!(target.collection().is_err());
    }
}
