//! Cross-crate integration test helpers.
//!
//! Provides utilities for testing interactions between
//! multiple JsonDB crates.

use jsondb_core::{Collection, CoreError, Record};
use std::collections::HashMap;

/// A test harness that mirrors a collection in memory.
///
/// Every successful operation is applied to a model as well, and
/// [`verify_all`](Self::verify_all) checks the collection still agrees.
pub struct IntegrationHarness<'a> {
    collection: &'a Collection,
    model: HashMap<String, Record>,
}

impl<'a> IntegrationHarness<'a> {
    /// Creates a harness over an empty collection.
    pub fn new(collection: &'a Collection) -> Self {
        Self {
            collection,
            model: HashMap::new(),
        }
    }

    /// Creates a record and tracks it.
    pub fn create(&mut self, record: Record) -> Result<Record, CoreError> {
        let created = self.collection.create(record)?;
        let id = created.id().expect("created records have an id");
        self.model.insert(id, created.clone());
        Ok(created)
    }

    /// Updates a record and tracks the result.
    pub fn update(&mut self, id: &str, patch: &Record) -> Result<Record, CoreError> {
        let updated = self.collection.update(id, patch)?;
        self.model.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    /// Deletes a record and stops tracking it.
    pub fn delete(&mut self, id: &str) -> Result<(), CoreError> {
        self.collection.delete(id)?;
        self.model.remove(id);
        Ok(())
    }

    /// Checks a lookup against the model.
    pub fn get_and_verify(&self, id: &str) -> Option<Record> {
        let actual = self.collection.find_by_id(id);
        assert_eq!(actual.as_ref(), self.model.get(id), "record mismatch for {id}");
        actual
    }

    /// Checks the whole collection against the model.
    pub fn verify_all(&self) {
        let records = self.collection.list_all();
        assert_eq!(records.len(), self.model.len(), "record count mismatch");
        for record in &records {
            let id = record.id().expect("stored records have an id");
            assert_eq!(Some(record), self.model.get(&id), "record mismatch for {id}");
        }
    }

    /// Returns the count of tracked records.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

/// Integration test scenarios.
pub mod scenarios {
    use super::*;
    use crate::fixtures::TestCollection;
    use jsondb_core::{FieldSpec, Schema, Value};

    /// Schema `{name: {type: string, required: true, length: {min: 3, max: 10}}}`.
    pub fn name_schema() -> Schema {
        Schema::merge([("name", FieldSpec::string().required().length(3, 10))])
            .expect("name schema is valid")
    }

    /// Runs the create/reject/create/delete/list walkthrough against
    /// `fixture`, which must use [`name_schema`].
    pub fn test_name_walkthrough(fixture: &TestCollection) {
        let ann = fixture.create(Record::new().with("name", "ann")).unwrap();
        assert_eq!(ann.id().as_deref(), Some("1"));

        let rejected = fixture.create(Record::new().with("name", "bo"));
        assert!(matches!(rejected, Err(CoreError::ValidationFailed { .. })));

        let eve = fixture.create(Record::new().with("name", "eve")).unwrap();
        assert_eq!(eve.id().as_deref(), Some("2"));

        fixture.delete("1").unwrap();
        assert!(fixture.find_by_id("1").is_none());

        let all = fixture.list_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("name"), Some(&Value::from("eve")));
    }

    /// Writes `garbage` over the document and checks that the next read
    /// yields an empty collection and a freshly initialized document.
    pub fn test_corruption_recovery(fixture: &TestCollection, garbage: &[u8]) {
        fixture.create(Record::new().with("name", "ann")).unwrap();
        fixture.overwrite_raw(garbage);

        assert!(fixture.list_all().is_empty());
        let rewritten = fixture.raw().expect("document is rewritten");
        assert_ne!(rewritten, garbage);

        // The fresh document is usable.
        let created = fixture.create(Record::new().with("name", "eve")).unwrap();
        assert_eq!(created.id().as_deref(), Some("1"));
        assert_eq!(fixture.list_all().len(), 1);
    }
}
