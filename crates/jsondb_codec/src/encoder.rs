//! JSON encoding of collection documents.

use crate::error::{CodecError, CodecResult};
use crate::value::{Record, Value};

/// Encodes a collection document (a JSON array of records).
///
/// With `pretty` the output is indented by two spaces, otherwise it is
/// compact.
pub fn encode_records(records: &[Record], pretty: bool) -> CodecResult<Vec<u8>> {
    let result = if pretty {
        serde_json::to_vec_pretty(records)
    } else {
        serde_json::to_vec(records)
    };
    result.map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Encodes a single value as compact JSON text.
pub fn encode_value(value: &Value) -> CodecResult<String> {
    serde_json::to_string(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}
