//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use jsondb_codec::{Record, Value, ID_FIELD};
use proptest::prelude::*;

/// Strategy for field names (never `id`).
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z0-9_]{0,11}")
        .expect("Invalid regex")
        .prop_filter("Field name must not be the id field", |s| s != ID_FIELD)
}

/// Strategy for scalar values. Numbers are integers so they compare
/// exactly after a text round trip.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        ".{0,24}".prop_map(Value::Text),
    ]
}

/// Strategy for arbitrary nested values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((field_name_strategy(), inner), 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

/// Strategy for records without an `id`, at most 10 fields.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::vec((field_name_strategy(), value_strategy()), 0..8)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for whole collections with distinct string ids.
pub fn collection_strategy() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..6).prop_map(|records| {
        records
            .into_iter()
            .enumerate()
            .map(|(i, mut record)| {
                record.set_id((i + 1).to_string());
                record
            })
            .collect()
    })
}

/// Strategy for user names accepted by
/// [`user_schema`](crate::fixtures::user_schema).
pub fn user_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_]{6,12}").expect("Invalid regex")
}

/// Strategy for strings of an exact character count.
pub fn text_of_length(len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), len).prop_map(|chars| chars.into_iter().collect())
}
