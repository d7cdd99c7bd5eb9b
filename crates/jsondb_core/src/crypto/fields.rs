//! Per-field encryption of record trees.

use crate::crypto::cipher::Cipher;
use crate::error::{CoreError, CoreResult};
use jsondb_codec::{Record, Value, ID_FIELD};

/// Applies a [`Cipher`] to every string leaf of a record tree.
///
/// `id` fields pass through unchanged at every nesting level, nested
/// records and arrays are walked, and numbers, booleans and nulls are left
/// as they are. Structure and field names stay in the clear.
#[derive(Debug, Clone, Copy)]
pub struct FieldCodec<'a> {
    cipher: &'a Cipher,
}

impl<'a> FieldCodec<'a> {
    /// Creates a field codec over `cipher`.
    #[must_use]
    pub fn new(cipher: &'a Cipher) -> Self {
        Self { cipher }
    }

    /// Encrypts every non-`id` string leaf of `record`.
    pub fn encrypt_record(&self, record: &Record) -> CoreResult<Record> {
        self.walk_record(record, &|text: &str| {
            self.cipher.encrypt_hex(text.as_bytes())
        })
    }

    /// Reverses [`encrypt_record`](Self::encrypt_record).
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` if any leaf is not a valid blob for this
    /// key or does not decrypt to UTF-8.
    pub fn decrypt_record(&self, record: &Record) -> CoreResult<Record> {
        self.walk_record(record, &|text: &str| {
            let plain = self.cipher.decrypt_hex(text)?;
            String::from_utf8(plain)
                .map_err(|_| CoreError::decryption_failed("field is not valid UTF-8"))
        })
    }

    /// Encrypts a whole collection.
    pub fn encrypt_records(&self, records: &[Record]) -> CoreResult<Vec<Record>> {
        records.iter().map(|r| self.encrypt_record(r)).collect()
    }

    /// Decrypts a whole collection.
    pub fn decrypt_records(&self, records: &[Record]) -> CoreResult<Vec<Record>> {
        records.iter().map(|r| self.decrypt_record(r)).collect()
    }

    fn walk_record<F>(&self, record: &Record, leaf: &F) -> CoreResult<Record>
    where
        F: Fn(&str) -> CoreResult<String>,
    {
        record
            .iter()
            .map(|(key, value)| {
                let value = if key == ID_FIELD {
                    value.clone()
                } else {
                    self.walk_value(value, leaf)?
                };
                Ok::<_, CoreError>((key.to_string(), value))
            })
            .collect()
    }

    fn walk_value<F>(&self, value: &Value, leaf: &F) -> CoreResult<Value>
    where
        F: Fn(&str) -> CoreResult<String>,
    {
        Ok(match value {
            Value::Text(text) => Value::Text(leaf(text)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.walk_value(item, leaf))
                    .collect::<CoreResult<_>>()?,
            ),
            Value::Object(record) => Value::Object(self.walk_record(record, leaf)?),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;

    fn sample() -> Record {
        Record::new()
            .with("id", "1")
            .with("name", "ann")
            .with("age", 30)
            .with("admin", false)
            .with("note", Value::Null)
            .with(
                "profile",
                Record::new().with("id", "inner").with("city", "Oslo"),
            )
            .with("tags", vec![Value::from("a"), Value::from(2)])
    }

    #[test]
    fn roundtrip() {
        let cipher = Cipher::new(&SecretKey::generate());
        let codec = FieldCodec::new(&cipher);

        let encrypted = codec.encrypt_record(&sample()).unwrap();
        assert_eq!(codec.decrypt_record(&encrypted).unwrap(), sample());
    }

    #[test]
    fn only_string_leaves_change() {
        let cipher = Cipher::new(&SecretKey::generate());
        let encrypted = FieldCodec::new(&cipher).encrypt_record(&sample()).unwrap();

        assert_eq!(encrypted.get("id"), Some(&Value::from("1")));
        assert_eq!(encrypted.get("age"), Some(&Value::from(30)));
        assert_eq!(encrypted.get("admin"), Some(&Value::Bool(false)));
        assert_eq!(encrypted.get("note"), Some(&Value::Null));
        assert_ne!(encrypted.get("name"), Some(&Value::from("ann")));
        assert_eq!(
            encrypted.keys().collect::<Vec<_>>(),
            sample().keys().collect::<Vec<_>>()
        );

        let Some(Value::Object(profile)) = encrypted.get("profile") else {
            panic!("profile should stay an object");
        };
        assert_eq!(profile.get("id"), Some(&Value::from("inner")));
        assert_ne!(profile.get("city"), Some(&Value::from("Oslo")));

        let Some(Value::Array(tags)) = encrypted.get("tags") else {
            panic!("tags should stay an array");
        };
        assert_eq!(tags[1], Value::from(2));
        assert_ne!(tags[0], Value::from("a"));
    }

    #[test]
    fn plaintext_leaf_fails_to_decrypt() {
        let cipher = Cipher::new(&SecretKey::generate());
        let codec = FieldCodec::new(&cipher);

        let result = codec.decrypt_record(&Record::new().with("name", "plain"));
        assert!(matches!(result, Err(CoreError::DecryptionFailed { .. })));
    }

    #[test]
    fn wrong_key_fails() {
        let cipher1 = Cipher::new(&SecretKey::generate());
        let cipher2 = Cipher::new(&SecretKey::generate());

        let encrypted = FieldCodec::new(&cipher1).encrypt_record(&sample()).unwrap();
        assert!(FieldCodec::new(&cipher2).decrypt_record(&encrypted).is_err());
    }
}
