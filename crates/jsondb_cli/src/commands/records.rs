//! Record commands: list, get, create, update, delete.

use super::{CommandResult, Target};
use jsondb_codec::{decode_value, Record, Value};

/// Prints every record as a JSON array.
pub fn list(target: &Target) -> CommandResult<()> {
    let records = target.collection()?.list_all();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Prints one record.
pub fn get(target: &Target, id: &str) -> CommandResult<()> {
    let record = target
        .collection()?
        .find_by_id(id)
        .ok_or_else(|| format!("record {id} not found in {}", target.name))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Creates a record and prints it with its id.
pub fn create(target: &Target, json: &str) -> CommandResult<()> {
    let input = parse_record(json)?;
    let record = target.collection()?.create(input)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Updates a record and prints the result.
pub fn update(target: &Target, id: &str, json: &str) -> CommandResult<()> {
    let patch = parse_record(json)?;
    let record = target.collection()?.update(id, &patch)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Deletes a record.
pub fn delete(target: &Target, id: &str) -> CommandResult<()> {
    target.collection()?.delete(id)?;
    println!("deleted {id} from {}", target.name);
    Ok(())
}

/// Parses a command-line argument as a JSON object.
pub fn parse_record(json: &str) -> CommandResult<Record> {
    match decode_value(json)? {
        Value::Object(record) => Ok(record),
        other => Err(format!("expected a JSON object, got {}", other.type_name()).into()),
    }
}
