//! Fuzz testing harnesses for JsonDB.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use crate::fixtures::config_for;
use jsondb_codec::{decode_records, encode_records};
use jsondb_core::{Collection, EncryptionMode, Record, Schema, Store};
use jsondb_storage::InMemoryBackend;

/// Fuzz target for document decoding.
///
/// Arbitrary bytes either decode to records that survive a re-encode, or
/// fail with an error. Never a panic.
pub fn fuzz_document_decode(data: &[u8]) {
    if let Ok(records) = decode_records(data) {
        if let Ok(encoded) = encode_records(&records, false) {
            let decoded = decode_records(&encoded).expect("re-encoded document decodes");
            assert_eq!(records, decoded, "Roundtrip mismatch");
        }
    }
}

/// Fuzz target for opening a store over an arbitrary document.
///
/// Whatever the bytes, the store opens and the collection ends up
/// readable.
pub fn fuzz_store_load(data: &[u8], mode: EncryptionMode) {
    let config = config_for(mode);
    let backend = InMemoryBackend::with_data(data.to_vec());
    let store = Store::with_backend(Box::new(backend.clone()), &config).expect("store opens");
    let collection = Collection::new("fuzz", store);
    let _ = collection.list_all();
    assert!(backend.data().is_some(), "document is present after load");
}

/// Fuzz target for schema documents.
pub fn fuzz_schema_document(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Schema::from_json(text);
    }
}

/// Fuzz target for collection operations.
///
/// Each byte picks an operation and an id. Arbitrary sequences must not
/// panic and ids stay unique.
pub fn fuzz_operations(data: &[u8]) {
    let store = Store::with_backend(
        Box::new(InMemoryBackend::new()),
        &config_for(EncryptionMode::None),
    )
    .expect("store opens");
    let collection = Collection::new("fuzz", store);

    for (i, byte) in data.iter().enumerate() {
        let id = (byte >> 2).to_string();
        match byte % 4 {
            0 => {
                let _ = collection.create(Record::new().with("n", i as i64));
            }
            1 => {
                let _ = collection.create(Record::new().with("id", id.as_str()).with("n", i as i64));
            }
            2 => {
                let _ = collection.update(&id, &Record::new().with("n", -(i as i64)));
            }
            _ => {
                let _ = collection.delete(&id);
            }
        }
    }

    let mut ids: Vec<_> = collection.list_all().iter().filter_map(Record::id).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total, "duplicate ids after fuzzed operations");
}
