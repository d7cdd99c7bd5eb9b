//! # JsonDB Codec
//!
//! Document model and JSON encoding/decoding for JsonDB.
//!
//! This crate provides:
//! - [`Value`], a closed recursive variant for field values
//! - [`Record`], an insertion-ordered field map with a reserved `id` field
//! - The collection document codec: a JSON array of records
//!
//! ## Usage
//!
//! ```
//! use jsondb_codec::{decode_records, encode_records, Record};
//!
//! let records = vec![Record::new().with("id", "1").with("name", "ann")];
//! let bytes = encode_records(&records, false).unwrap();
//! assert_eq!(decode_records(&bytes).unwrap(), records);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{decode_records, decode_value, is_blank};
pub use encoder::{encode_records, encode_value};
pub use error::{CodecError, CodecResult};
pub use value::{Number, Record, Value, ID_FIELD};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::from),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..4)
                    .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn document_roundtrip(
            docs in prop::collection::vec(
                prop::collection::vec(("[a-z]{1,6}", value()), 0..6),
                0..5,
            ),
            pretty in any::<bool>(),
        ) {
            let records: Vec<Record> = docs
                .into_iter()
                .map(|pairs| pairs.into_iter().collect())
                .collect();
            let bytes = encode_records(&records, pretty).unwrap();
            prop_assert_eq!(decode_records(&bytes).unwrap(), records);
        }
    }
}
