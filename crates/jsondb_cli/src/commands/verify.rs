//! Verify command implementation.

use super::{CommandResult, Target};

/// Reads a collection without recovery.
///
/// Unlike every other command, nothing is rewritten: a missing,
/// undecryptable, or corrupt file is reported and the command fails.
pub fn run(target: &Target) -> CommandResult<()> {
    let db = target.database()?;
    let store = db.detached_store(&target.name)?;

    println!("Verifying {}", store.describe());
    println!("  Mode: {}", store.mode());

    match store.try_load() {
        Ok(records) => {
            println!("  Records: {}", records.len());
            println!();
            println!("✓ Collection verification passed");
            Ok(())
        }
        Err(e) => {
            println!("  Error [{}]: {e}", e.code());
            println!();
            println!("✗ Collection verification failed");
            Err("Verification failed".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn target(dir: &std::path::Path) -> Target {
        Target {
            dir: dir.to_path_buf(),
            key: None,
            name: "users".to_string(),
            schema: None,
        }
    }

    #[test]
    fn healthy_collection_passes() {
        let dir = tempdir().unwrap();
        let target = target(dir.path());
        target
            .collection()
            .unwrap()
            .create(jsondb_core::Record::new().with("name", "ann"))
            .unwrap();

        assert!(run(&target).is_ok());
    }

    #[test]
    fn corrupt_collection_fails_and_is_kept() {
        let dir = tempdir().unwrap();
        let target = target(dir.path());
        let path = dir.path().join("users.jsondb");
        fs::write(&path, "deadbeef").unwrap();

        assert!(run(&target).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "deadbeef");
    }

    #[test]
    fn missing_collection_fails() {
        let dir = tempdir().unwrap();
        assert!(run(&target(dir.path())).is_err());
        assert!(!dir.path().join("users.jsondb").exists());
    }
}
