//! Inspect command implementation.

use super::{open_database, CommandResult};
use jsondb_core::Database;
use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database directory.
    pub path: String,
    /// Encryption mode shared by all collections.
    pub mode: String,
    /// Per-collection details.
    pub collections: Vec<CollectionStats>,
}

/// Details of a single collection.
#[derive(Debug, Serialize)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Number of records, if the file could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    /// Why the file could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the inspect command. Files are read but never rewritten.
pub fn run(
    dir: &Path,
    key: Option<&str>,
    name: Option<&str>,
    format: &str,
) -> CommandResult<()> {
    let db = open_database(dir, key)?;
    let result = inspect(&db, name)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects details for `name`, or for every collection in the directory.
pub fn inspect(db: &Database, name: Option<&str>) -> CommandResult<InspectResult> {
    let names = match name {
        Some(name) => vec![name.to_string()],
        None => db.collection_names()?,
    };

    let mut collections = Vec::with_capacity(names.len());
    for name in names {
        let store = db.detached_store(&name)?;
        let (record_count, error) = match store.try_load() {
            Ok(records) => (Some(records.len()), None),
            Err(e) => (None, Some(format!("[{}] {e}", e.code()))),
        };
        collections.push(CollectionStats {
            file_size: store.size()?,
            name,
            record_count,
            error,
        });
    }

    Ok(InspectResult {
        path: db.dir().display().to_string(),
        mode: db.config().encryption.to_string(),
        collections,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("JsonDB Inspection");
    println!("=================");
    println!();
    println!("Path: {}", result.path);
    println!("Mode: {}", result.mode);
    println!();
    println!("Collections:");
    if result.collections.is_empty() {
        println!("  (none)");
    }
    for col in &result.collections {
        match (&col.record_count, &col.error) {
            (Some(count), _) => println!(
                "  {}: {} records, {}",
                col.name,
                count,
                format_size(col.file_size)
            ),
            (None, Some(error)) => println!(
                "  {}: unreadable ({}), {}",
                col.name,
                error,
                format_size(col.file_size)
            ),
            (None, None) => println!("  {}: {}", col.name, format_size(col.file_size)),
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsondb_core::{Config, Record, Schema};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reports_each_collection() {
        let dir = tempdir().unwrap();
        let db = Database::open_with_config(dir.path(), Config::new()).unwrap();
        let users = db.collection_with_schema("users", Schema::empty()).unwrap();
        users.create(Record::new().with("name", "ann")).unwrap();
        users.create(Record::new().with("name", "eve")).unwrap();
        fs::write(dir.path().join("broken.jsondb"), "{oops").unwrap();

        let result = inspect(&db, None).unwrap();
        assert_eq!(result.mode, "none");
        assert_eq!(result.collections.len(), 2);

        let broken = &result.collections[0];
        assert_eq!(broken.name, "broken");
        assert!(broken.error.as_deref().unwrap().starts_with("[E003]"));
        assert_eq!(fs::read_to_string(dir.path().join("broken.jsondb")).unwrap(), "{oops");

        let users = &result.collections[1];
        assert_eq!(users.record_count, Some(2));
        assert!(users.file_size > 0);
    }

    #[test]
    fn format_sizes() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
