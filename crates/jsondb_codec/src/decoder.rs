//! JSON decoding of collection documents.

use crate::error::{CodecError, CodecResult};
use crate::value::{Record, Value};

/// Returns `true` if the bytes are empty or only ASCII whitespace.
#[must_use]
pub fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Decodes a collection document.
///
/// The input must be a JSON array whose elements are all objects.
///
/// # Errors
///
/// - `DecodingFailed` for malformed JSON or invalid UTF-8
/// - `InvalidStructure` for well-formed JSON of the wrong shape
pub fn decode_records(bytes: &[u8]) -> CodecResult<Vec<Record>> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(CodecError::invalid_structure(format!(
                "expected array of records, found {}",
                other.type_name()
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(CodecError::invalid_structure(format!(
                "element {index} is {}, expected object",
                other.type_name()
            ))),
        })
        .collect()
}

/// Decodes a single JSON value.
pub fn decode_value(text: &str) -> CodecResult<Value> {
    serde_json::from_str(text).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(is_blank(b""));
        assert!(is_blank(b"  \n\t"));
        assert!(!is_blank(b" [] "));
    }

    #[test]
    fn decode_empty_array() {
        assert!(decode_records(b"[]").unwrap().is_empty());
    }

    #[test]
    fn decode_records_in_order() {
        let records = decode_records(br#"[{"id":"1"},{"id":"2"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id().as_deref(), Some("2"));
    }

    #[test]
    fn malformed_json_fails() {
        let result = decode_records(b"not json at all");
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn truncated_json_fails() {
        let result = decode_records(br#"[{"id":"1","name":"an"#);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn top_level_object_is_invalid_structure() {
        let result = decode_records(br#"{"id":"1"}"#);
        assert!(matches!(result, Err(CodecError::InvalidStructure { .. })));
    }

    #[test]
    fn scalar_element_is_invalid_structure() {
        let result = decode_records(br#"[{"id":"1"}, 5]"#);
        assert!(matches!(result, Err(CodecError::InvalidStructure { .. })));
    }

    #[test]
    fn decode_single_value() {
        assert_eq!(decode_value("true").unwrap(), Value::Bool(true));
        assert!(decode_value("{").is_err());
    }
}
