//! Schema-validated CRUD over one store.

use crate::collection::validate::validate;
use crate::config::EncryptionMode;
use crate::error::{Code, CoreError, CoreResult};
use crate::schema::Schema;
use crate::store::Store;
use jsondb_codec::{Record, Value, ID_FIELD};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// A named collection of schema-validated records.
///
/// Every operation re-reads the whole file, applies its change, and writes
/// the whole file back. Nothing is cached between calls, so changes made to
/// the file by other means are picked up by the next operation.
///
/// Operations on one `Collection` are serialized by an internal lock; the
/// read-modify-write cycle of one call never interleaves with another. Two
/// `Collection`s (or two processes) over the same file are not
/// coordinated.
///
/// # Example
///
/// ```
/// use jsondb_core::{Collection, Config, FieldSpec, Record, Schema, Store};
/// use jsondb_storage::InMemoryBackend;
///
/// let store = Store::with_backend(Box::new(InMemoryBackend::new()), &Config::new())?;
/// let schema = Schema::merge([("name", FieldSpec::string().required().length(3, 10))])?;
/// let users = Collection::with_schema("users", store, schema);
///
/// let ann = users.create(Record::new().with("name", "ann"))?;
/// assert_eq!(ann.id().as_deref(), Some("1"));
/// assert!(users.create(Record::new().with("name", "bo")).is_err());
/// # Ok::<(), jsondb_core::CoreError>(())
/// ```
#[derive(Debug)]
pub struct Collection {
    name: String,
    schema: Schema,
    store: Mutex<Store>,
}

impl Collection {
    /// Creates a collection without field rules.
    pub fn new(name: impl Into<String>, store: Store) -> Self {
        Self::with_schema(name, store, Schema::empty())
    }

    /// Creates a collection validated by `schema`.
    pub fn with_schema(name: impl Into<String>, store: Store, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            store: Mutex::new(store),
        }
    }

    /// The collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field rules.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The encryption mode of the backing file.
    #[must_use]
    pub fn mode(&self) -> EncryptionMode {
        self.store.lock().mode()
    }

    /// Where the backing file lives.
    #[must_use]
    pub fn describe(&self) -> String {
        self.store.lock().describe()
    }

    /// Size of the backing file in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    pub fn file_size(&self) -> CoreResult<u64> {
        self.store.lock().size()
    }

    /// Creates a record.
    ///
    /// Without an `id` (or with an empty one), the record gets one more
    /// than the largest numeric id in the collection. A numeric `id` is
    /// stored in string form. Absent fields with a default are filled.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the record breaks a field rule
    /// - `DuplicateId` if a record with the same id exists
    pub fn create(&self, input: Record) -> CoreResult<Record> {
        let result = self.create_inner(input);
        match &result {
            Ok(record) => info!(
                code = %Code::Created,
                collection = %self.name,
                record_id = %record.id().unwrap_or_default(),
                "record created"
            ),
            Err(e) => self.log_rejection("create", e),
        }
        result
    }

    fn create_inner(&self, input: Record) -> CoreResult<Record> {
        let mut store = self.store.lock();
        let mut records = store.load();

        let mut record = input;
        let id = match record.get(ID_FIELD) {
            Some(value) if !is_unset_id(value) => value.to_key_string().ok_or_else(|| {
                CoreError::validation(
                    ID_FIELD,
                    format!("expected string or number, found {}", value.type_name()),
                )
            })?,
            _ => next_id(&records),
        };
        record.set_id(id.as_str());

        let record = validate(&self.schema, &record, &records)?;
        if records.iter().any(|r| r.id().as_deref() == Some(id.as_str())) {
            return Err(CoreError::duplicate_id(id));
        }

        records.push(record.clone());
        self.persist(&mut store, records);
        Ok(record)
    }

    /// Finds the record whose id equals `id`.
    ///
    /// Returns `None` (and logs it) if there is no such record.
    pub fn find_by_id(&self, id: &str) -> Option<Record> {
        let records = self.store.lock().load();
        let found = records.into_iter().find(|r| r.id().as_deref() == Some(id));
        if found.is_none() {
            warn!(
                code = %Code::NotFound,
                collection = %self.name,
                record_id = id,
                "record not found"
            );
        }
        found
    }

    /// Merges `patch` over the record with `id` and returns the result.
    ///
    /// Fields missing from `patch` keep their values. An `id` in `patch`
    /// is ignored.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no such record
    /// - `ValidationFailed` if the merged record breaks a field rule
    pub fn update(&self, id: &str, patch: &Record) -> CoreResult<Record> {
        let result = self.update_inner(id, patch);
        match &result {
            Ok(_) => info!(
                code = %Code::Updated,
                collection = %self.name,
                record_id = id,
                "record updated"
            ),
            Err(e) => self.log_rejection("update", e),
        }
        result
    }

    fn update_inner(&self, id: &str, patch: &Record) -> CoreResult<Record> {
        let mut store = self.store.lock();
        let mut records = store.load();
        let index = position(&records, id)?;

        let mut merged = records[index].clone();
        merged.merge(patch);

        let record = validate(&self.schema, &merged, &records)?;
        records[index] = record.clone();
        self.persist(&mut store, records);
        Ok(record)
    }

    /// Deletes the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such record.
    pub fn delete(&self, id: &str) -> CoreResult<()> {
        let result = self.delete_inner(id);
        match &result {
            Ok(()) => info!(
                code = %Code::Deleted,
                collection = %self.name,
                record_id = id,
                "record deleted"
            ),
            Err(e) => self.log_rejection("delete", e),
        }
        result
    }

    fn delete_inner(&self, id: &str) -> CoreResult<()> {
        let mut store = self.store.lock();
        let mut records = store.load();
        let index = position(&records, id)?;
        records.remove(index);
        self.persist(&mut store, records);
        Ok(())
    }

    /// Returns every record, in insertion order.
    pub fn list_all(&self) -> Vec<Record> {
        let records = self.store.lock().load();
        info!(
            code = %Code::Listed,
            collection = %self.name,
            count = records.len(),
            "records listed"
        );
        records
    }

    /// Saves through the store. A failed save has already been logged by
    /// the store and leaves the collection in memory, so the operation
    /// still succeeds.
    fn persist(&self, store: &mut Store, records: Vec<Record>) {
        if let Err(e) = store.save(records) {
            debug!(collection = %self.name, error = %e, "continuing with unsaved collection");
        }
    }

    fn log_rejection(&self, operation: &str, error: &CoreError) {
        warn!(
            code = %error.code(),
            collection = %self.name,
            operation,
            error = %error,
            "operation rejected"
        );
    }
}

fn position(records: &[Record], id: &str) -> CoreResult<usize> {
    records
        .iter()
        .position(|r| r.id().as_deref() == Some(id))
        .ok_or_else(|| CoreError::not_found(id))
}

/// An id that asks for one to be assigned.
fn is_unset_id(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Text(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(true) | Value::Array(_) | Value::Object(_) => false,
    }
}

/// One more than the largest numeric id. Ids without a leading integer
/// count as 0.
fn next_id(records: &[Record]) -> String {
    let max = records
        .iter()
        .filter_map(Record::id)
        .filter_map(|id| leading_integer(&id))
        .max()
        .unwrap_or(0);
    max.saturating_add(1).to_string()
}

/// The non-negative integer at the start of `text`, after optional
/// whitespace and a `+` sign. Negative numbers yield `None`.
fn leading_integer(text: &str) -> Option<u64> {
    let text = text.trim_start();
    let text = text.strip_prefix('+').unwrap_or(text);
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let digits = &text[..end];
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::schema::FieldSpec;
    use jsondb_storage::InMemoryBackend;
    use std::sync::Arc;
    use std::thread;

    fn store(backend: &InMemoryBackend) -> Store {
        Store::with_backend(Box::new(backend.clone()), &Config::new()).unwrap()
    }

    fn users(backend: &InMemoryBackend) -> Collection {
        let schema = Schema::merge([
            ("name", FieldSpec::string().required().length(3, 10).unique()),
            ("age", FieldSpec::number()),
        ])
        .unwrap();
        Collection::with_schema("users", store(backend), schema)
    }

    fn named(name: &str) -> Record {
        Record::new().with("name", name)
    }

    #[test]
    fn scenario() {
        let backend = InMemoryBackend::new();
        let schema =
            Schema::merge([("name", FieldSpec::string().required().length(3, 10))]).unwrap();
        let users = Collection::with_schema("users", store(&backend), schema);

        let ann = users.create(named("ann")).unwrap();
        assert_eq!(ann.id().as_deref(), Some("1"));

        assert!(matches!(
            users.create(named("bo")),
            Err(CoreError::ValidationFailed { .. })
        ));

        let eve = users.create(named("eve")).unwrap();
        assert_eq!(eve.id().as_deref(), Some("2"));

        users.delete("1").unwrap();
        assert!(users.find_by_id("1").is_none());

        let all = users.list_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("name"), Some(&Value::from("eve")));
    }

    #[test]
    fn create_then_find() {
        let backend = InMemoryBackend::new();
        let users = users(&backend);

        let created = users.create(named("ann").with("age", 30)).unwrap();
        assert_eq!(created.keys().next(), Some("id"));
        let found = users.find_by_id(&created.id().unwrap()).unwrap();
        assert_eq!(found, created);
    }

    #[test]
    fn defaults_are_filled() {
        let backend = InMemoryBackend::new();
        let created = users(&backend).create(named("ann")).unwrap();
        assert_eq!(created.get("age"), Some(&Value::from(0)));
    }

    #[test]
    fn unique_field_rejects_second_create() {
        let backend = InMemoryBackend::new();
        let users = users(&backend);

        users.create(named("ann")).unwrap();
        assert!(matches!(
            users.create(named("ann")),
            Err(CoreError::ValidationFailed { ref field, .. }) if field == "name"
        ));
        assert_eq!(users.list_all().len(), 1);
    }

    #[test]
    fn duplicate_explicit_id() {
        let backend = InMemoryBackend::new();
        let users = Collection::new("users", store(&backend));

        users.create(Record::new().with("id", "7")).unwrap();
        let result = users.create(Record::new().with("id", 7));
        assert!(matches!(result, Err(CoreError::DuplicateId { ref id }) if id == "7"));
    }

    #[test]
    fn numeric_id_is_stored_as_string() {
        let backend = InMemoryBackend::new();
        let users = Collection::new("users", store(&backend));

        let created = users.create(Record::new().with("id", 42)).unwrap();
        assert_eq!(created.get("id"), Some(&Value::from("42")));
        assert!(users.find_by_id("42").is_some());
    }

    #[test]
    fn unset_ids_are_assigned() {
        let backend = InMemoryBackend::new();
        let users = Collection::new("users", store(&backend));

        for id in [Value::from(""), Value::Null, Value::from(0), Value::Bool(false)] {
            users.create(Record::new().with("id", id)).unwrap();
        }
        let ids: Vec<_> = users.list_all().iter().filter_map(Record::id).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
    }

    #[test]
    fn next_id_uses_leading_integer() {
        let backend = InMemoryBackend::new();
        let users = Collection::new("users", store(&backend));

        users.create(Record::new().with("id", "10abc")).unwrap();
        users.create(Record::new().with("id", "zeta")).unwrap();
        let created = users.create(Record::new()).unwrap();
        assert_eq!(created.id().as_deref(), Some("11"));
    }

    #[test]
    fn leading_integer_parsing() {
        assert_eq!(leading_integer("12"), Some(12));
        assert_eq!(leading_integer("  +3x"), Some(3));
        assert_eq!(leading_integer("-4"), None);
        assert_eq!(leading_integer("abc"), None);
        assert_eq!(leading_integer("99999999999999999999999"), Some(u64::MAX));
        assert_eq!(
            next_id(&[Record::new().with("id", "99999999999999999999999")]),
            u64::MAX.to_string()
        );
    }

    #[test]
    fn assigned_id_counts_toward_field_cap() {
        let backend = InMemoryBackend::new();
        let notes = Collection::new("notes", store(&backend));

        let mut record = Record::new();
        for i in 0..10 {
            record.insert(format!("f{i}"), i as i64);
        }
        let err = notes.create(record.clone()).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { ref field, .. } if field == "id"));
        assert!(notes.list_all().is_empty());

        record.remove("f9");
        let created = notes.create(record).unwrap();
        assert_eq!(created.len(), 10);

        // A patch that adds an eleventh field is rejected too.
        let err = notes.update("1", &Record::new().with("extra", true)).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
    }

    #[test]
    fn update_merges_fields() {
        let backend = InMemoryBackend::new();
        let users = users(&backend);
        users.create(named("ann").with("age", 30)).unwrap();

        let updated = users
            .update("1", &Record::new().with("age", 31).with("id", "99"))
            .unwrap();
        assert_eq!(updated.get("name"), Some(&Value::from("ann")));
        assert_eq!(updated.get("age"), Some(&Value::from(31)));
        assert_eq!(updated.id().as_deref(), Some("1"));
        assert_eq!(users.find_by_id("1"), Some(updated));
    }

    #[test]
    fn update_keeps_own_unique_value() {
        let backend = InMemoryBackend::new();
        let users = users(&backend);
        users.create(named("ann")).unwrap();
        users.create(named("eve")).unwrap();

        assert!(users.update("1", &named("ann")).is_ok());
        assert!(users.update("1", &named("eve")).is_err());
        assert_eq!(users.find_by_id("1").unwrap().get("name"), Some(&Value::from("ann")));
    }

    #[test]
    fn misses_are_not_found() {
        let backend = InMemoryBackend::new();
        let users = users(&backend);

        assert!(users.find_by_id("1").is_none());
        assert!(matches!(users.update("1", &named("ann")), Err(CoreError::NotFound { .. })));
        assert!(matches!(users.delete("1"), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn external_changes_are_seen() {
        let backend = InMemoryBackend::new();
        let users = users(&backend);
        users.create(named("ann")).unwrap();

        backend.set_data(br#"[{"id": "5", "name": "zed"}]"#.to_vec());
        assert!(users.find_by_id("1").is_none());
        assert!(users.find_by_id("5").is_some());
        assert_eq!(users.create(named("bob")).unwrap().id().as_deref(), Some("6"));
    }

    #[test]
    fn failed_save_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.jsondb");
        std::fs::create_dir(&path).unwrap();

        let store = Store::open(&path, &Config::new()).unwrap();
        let users = Collection::new("users", store);
        assert!(users.create(named("ann")).is_ok());
    }

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let backend = InMemoryBackend::new();
        let users = Arc::new(Collection::new("users", store(&backend)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let users = Arc::clone(&users);
                thread::spawn(move || {
                    for _ in 0..5 {
                        users.create(Record::new()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids: Vec<u64> = users
            .list_all()
            .iter()
            .filter_map(|r| r.id()?.parse().ok())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }
}
