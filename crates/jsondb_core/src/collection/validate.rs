//! Record validation against a schema.

use crate::error::{CoreError, CoreResult};
use crate::schema::{FieldRule, FieldType, Schema, MAX_FIELDS};
use jsondb_codec::{Record, Value, ID_FIELD};

/// Validates `record` against `schema`, filling absent fields that have a
/// default.
///
/// `existing` is the collection the record is about to join. For unique
/// fields, a record with the same `id` is not a conflict, so an updated
/// record may be checked against a collection that still holds its old
/// version.
///
/// The first failing check rejects the whole record.
///
/// # Errors
///
/// Returns `ValidationFailed` naming the first offending field.
pub fn validate(schema: &Schema, record: &Record, existing: &[Record]) -> CoreResult<Record> {
    let mut record = record.clone();
    for (name, rule) in schema.iter() {
        if let (false, Some(default)) = (record.contains_key(name), &rule.default) {
            record.insert(name, default.clone());
        }
    }

    // Counted after defaults are filled, `id` included.
    let populated = record.iter().filter(|(_, v)| !v.is_null()).count();
    if populated > MAX_FIELDS {
        return Err(CoreError::validation(
            ID_FIELD,
            format!("record has {populated} fields, maximum is {MAX_FIELDS}"),
        ));
    }

    for (name, rule) in schema.iter() {
        let value = match record.get(name) {
            Some(value) => value,
            None if rule.required => {
                return Err(CoreError::validation(name, "required field is missing"));
            }
            None => continue,
        };

        if value.is_null() {
            if rule.required {
                return Err(CoreError::validation(name, "required field is null"));
            }
            continue;
        }
        if !rule.required && value.as_str() == Some("") {
            continue;
        }

        check_value(name, rule, value)?;

        if rule.unique {
            let id = record.id();
            let taken = existing.iter().any(|other| {
                other.id() != id && other.get(name).is_some_and(|v| same_value(v, value))
            });
            if taken {
                return Err(CoreError::validation(name, "value is already taken"));
            }
        }
    }

    Ok(record)
}

/// Value equality for uniqueness. Numbers compare by numeric value, so
/// `1` and `1.0` are the same.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn check_value(name: &str, rule: &FieldRule, value: &Value) -> CoreResult<()> {
    match (rule.field_type, value) {
        (FieldType::String, Value::Text(text)) => {
            if let Some(pattern) = &rule.pattern {
                if !text.is_empty() && !pattern.is_match(text) {
                    return Err(CoreError::validation(name, "value does not match pattern"));
                }
            }
            let len = text.chars().count();
            if !rule.length.contains(len) {
                return Err(CoreError::validation(
                    name,
                    format!(
                        "length {len} outside {}..={}",
                        rule.length.min, rule.length.max
                    ),
                ));
            }
            Ok(())
        }
        (FieldType::Number, Value::Number(_)) | (FieldType::Boolean, Value::Bool(_)) => Ok(()),
        (expected, other) => Err(CoreError::validation(
            name,
            format!("expected {expected}, found {}", other.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn name_schema() -> Schema {
        Schema::merge([("name", FieldSpec::string().required().length(3, 10))]).unwrap()
    }

    fn failing_field(result: CoreResult<Record>) -> String {
        match result {
            Err(CoreError::ValidationFailed { field, .. }) => field,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn length_boundaries() {
        let schema = name_schema();
        for ok in ["ann", "abcdefghij"] {
            assert!(validate(&schema, &Record::new().with("name", ok), &[]).is_ok());
        }
        for bad in ["an", "abcdefghijk"] {
            let result = validate(&schema, &Record::new().with("name", bad), &[]);
            assert_eq!(failing_field(result), "name");
        }
    }

    #[test]
    fn length_counts_characters() {
        let schema = name_schema();
        assert!(validate(&schema, &Record::new().with("name", "åäö"), &[]).is_ok());
    }

    #[test]
    fn required_without_default_fails() {
        let result = validate(&name_schema(), &Record::new(), &[]);
        assert_eq!(failing_field(result), "name");
    }

    #[test]
    fn required_null_fails() {
        let result = validate(&name_schema(), &Record::new().with("name", Value::Null), &[]);
        assert_eq!(failing_field(result), "name");
    }

    #[test]
    fn required_with_default_is_filled() {
        let schema =
            Schema::merge([("role", FieldSpec::string().required().default_value("user"))])
                .unwrap();
        let record = validate(&schema, &Record::new(), &[]).unwrap();
        assert_eq!(record.get("role"), Some(&Value::from("user")));
    }

    #[test]
    fn optional_empty_skips_checks() {
        let schema = Schema::merge([(
            "avatar",
            FieldSpec::string().regex("https?://.+").length(5, 50),
        )])
        .unwrap();
        for value in [Value::from(""), Value::Null] {
            let record = Record::new().with("avatar", value);
            assert!(validate(&schema, &record, &[]).is_ok());
        }
        let record = Record::new().with("avatar", "ftp://x");
        assert_eq!(failing_field(validate(&schema, &record, &[])), "avatar");
    }

    #[test]
    fn no_type_coercion() {
        let schema = Schema::merge([
            ("age", FieldSpec::number()),
            ("admin", FieldSpec::boolean()),
        ])
        .unwrap();

        let record = Record::new().with("age", "30");
        assert_eq!(failing_field(validate(&schema, &record, &[])), "age");

        let record = Record::new().with("admin", "true");
        assert_eq!(failing_field(validate(&schema, &record, &[])), "admin");

        let record = Record::new().with("age", 30).with("admin", true);
        assert!(validate(&schema, &record, &[]).is_ok());
    }

    #[test]
    fn huge_numbers_are_plain_numbers() {
        let schema = Schema::merge([("n", FieldSpec::number())]).unwrap();
        let big = jsondb_codec::decode_value(&"9".repeat(65)).unwrap();
        // 65 nines parse as a float, written back in exponent notation.
        assert!(jsondb_codec::encode_value(&big).unwrap().len() < 64);
        let record = Record::new().with("n", big);
        assert!(validate(&schema, &record, &[]).is_ok());

        let record = Record::new().with("n", -12_345);
        assert!(validate(&schema, &record, &[]).is_ok());
    }

    #[test]
    fn unique_ignores_same_id() {
        let schema = Schema::merge([("email", FieldSpec::string().unique())]).unwrap();
        let existing = vec![Record::new().with("id", "1").with("email", "a@x")];

        let clash = Record::new().with("id", "2").with("email", "a@x");
        assert_eq!(failing_field(validate(&schema, &clash, &existing)), "email");

        let same = Record::new().with("id", "1").with("email", "a@x");
        assert!(validate(&schema, &same, &existing).is_ok());
    }

    #[test]
    fn too_many_fields() {
        let mut record = Record::new().with("id", "1");
        for i in 0..MAX_FIELDS {
            record.insert(format!("f{i}"), i as i64);
        }
        // Ten fields plus the id is one too many.
        let result = validate(&Schema::empty(), &record, &[]);
        assert_eq!(failing_field(result), ID_FIELD);

        record.remove("f0");
        assert!(validate(&Schema::empty(), &record, &[]).is_ok());

        // Null fields are not populated.
        record.insert("f0", Value::Null);
        assert!(validate(&Schema::empty(), &record, &[]).is_ok());
    }

    #[test]
    fn field_cap_counts_defaults() {
        let schema = Schema::merge([
            ("a", FieldSpec::number()),
            ("b", FieldSpec::number()),
            ("c", FieldSpec::boolean()),
        ])
        .unwrap();

        let mut record = Record::new().with("id", "1");
        for i in 0..7 {
            record.insert(format!("x{i}"), i as i64);
        }
        // 1 id + 7 given + 3 defaults.
        assert_eq!(failing_field(validate(&schema, &record, &[])), ID_FIELD);

        record.remove("x0");
        let filled = validate(&schema, &record, &[]).unwrap();
        assert_eq!(filled.len(), MAX_FIELDS);
    }

    #[test]
    fn unique_numbers_compare_by_value() {
        let schema = Schema::merge([("badge", FieldSpec::number().unique())]).unwrap();
        let existing = vec![Record::new().with("id", "1").with("badge", 1)];

        let float = Record::new()
            .with("id", "2")
            .with("badge", Value::from_f64(1.0).unwrap());
        assert_eq!(failing_field(validate(&schema, &float, &existing)), "badge");

        let other = Record::new()
            .with("id", "2")
            .with("badge", Value::from_f64(1.5).unwrap());
        assert!(validate(&schema, &other, &existing).is_ok());
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let schema = Schema::merge([
            ("name", FieldSpec::string().required()),
            ("admin", FieldSpec::boolean()),
            ("avatar", FieldSpec::string().default_value("https://example.com/u.png")),
        ])
        .unwrap();
        let record = validate(&schema, &Record::new().with("name", "ann"), &[]).unwrap();
        assert_eq!(record.get("admin"), Some(&Value::Bool(false)));
        assert_eq!(
            record.get("avatar"),
            Some(&Value::from("https://example.com/u.png"))
        );
    }
}
