//! Declarative field rules for a collection.
//!
//! Callers describe fields with [`FieldSpec`]s, either in code or as a JSON
//! document. [`Schema::merge`] overlays each spec on the built-in rule for
//! its type and compiles it into a [`FieldRule`].

use crate::error::{CoreError, CoreResult};
use jsondb_codec::{CodecError, Value};
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Maximum number of fields a schema, or a record, may declare.
pub const MAX_FIELDS: usize = 10;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 text.
    String,
    /// JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
}

impl FieldType {
    /// Parses a type name as written in a schema document.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            _ => None,
        }
    }

    /// The type name as written in a schema document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }

    /// Returns `true` if `value` has exactly this type. No coercion.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::String, Value::Text(_))
                | (FieldType::Number, Value::Number(_))
                | (FieldType::Boolean, Value::Bool(_))
        )
    }

    /// The default a non-required field of this type gets when none is
    /// declared.
    #[must_use]
    pub fn builtin_default(self) -> Value {
        match self {
            FieldType::String => Value::Text(String::new()),
            FieldType::Number => Value::from(0),
            FieldType::Boolean => Value::Bool(false),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive character-length bounds for string fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthBounds {
    /// Minimum length in characters.
    pub min: usize,
    /// Maximum length in characters.
    pub max: usize,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self { min: 0, max: 255 }
    }
}

impl LengthBounds {
    /// Returns `true` if `len` is within the bounds.
    #[must_use]
    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

/// A field as declared by the caller, before merging.
///
/// Every attribute is optional. The type defaults to `string`.
///
/// ```
/// use jsondb_core::FieldSpec;
///
/// let name = FieldSpec::string().required().length(3, 10).unique();
/// let admin = FieldSpec::boolean().default_value(false);
/// # let _ = (name, admin);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// Type name: `string`, `number`, or `boolean`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Whether the field must be present.
    pub required: bool,
    /// Value used when the field is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Pattern a non-empty string value must match in full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Character-length bounds for strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthBounds>,
    /// Whether no two records may share a value.
    pub unique: bool,
}

impl FieldSpec {
    fn typed(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type.as_str().to_string()),
            ..Self::default()
        }
    }

    /// A string field.
    #[must_use]
    pub fn string() -> Self {
        Self::typed(FieldType::String)
    }

    /// A number field.
    #[must_use]
    pub fn number() -> Self {
        Self::typed(FieldType::Number)
    }

    /// A boolean field.
    #[must_use]
    pub fn boolean() -> Self {
        Self::typed(FieldType::Boolean)
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the pattern.
    #[must_use]
    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    /// Sets the length bounds.
    #[must_use]
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.length = Some(LengthBounds { min, max });
        self
    }

    /// Marks the field as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A merged, compiled field rule.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Declared type.
    pub field_type: FieldType,
    /// Whether the field must be present.
    pub required: bool,
    /// Value applied when the field is absent. Required fields only get
    /// one when it was declared explicitly.
    pub default: Option<Value>,
    /// Full-match pattern for non-empty strings.
    pub pattern: Option<Regex>,
    /// Length bounds for strings.
    pub length: LengthBounds,
    /// Whether values must be unique across the collection.
    pub unique: bool,
}

impl FieldRule {
    fn merge(name: &str, spec: FieldSpec) -> CoreResult<Self> {
        let type_name = spec.field_type.as_deref().unwrap_or("string");
        let field_type =
            FieldType::parse(type_name).ok_or_else(|| CoreError::InvalidFieldType {
                field: name.to_string(),
                type_name: type_name.to_string(),
            })?;

        if let Some(default) = &spec.default {
            if !field_type.matches(default) {
                return Err(CoreError::InvalidDefault {
                    field: name.to_string(),
                    expected: field_type.as_str(),
                });
            }
        }

        let pattern = spec
            .regex
            .as_deref()
            .map(|p| Regex::new(&format!("^(?:{p})$")))
            .transpose()
            .map_err(|e| CoreError::InvalidRegex {
                field: name.to_string(),
                message: e.to_string(),
            })?;

        let default = match spec.default {
            Some(value) => Some(value),
            None if spec.required => None,
            None => Some(field_type.builtin_default()),
        };

        Ok(Self {
            field_type,
            required: spec.required,
            default,
            pattern,
            length: spec.length.unwrap_or_default(),
            unique: spec.unique,
        })
    }
}

/// Ordered field rules of one collection.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldRule)>,
}

impl Schema {
    /// An empty schema: every record is accepted as-is.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merges caller specs over the built-in rules.
    ///
    /// # Errors
    ///
    /// - `SchemaTooLarge` for more than [`MAX_FIELDS`] fields
    /// - `InvalidFieldType` for a type other than string, number, boolean
    /// - `InvalidDefault` for a default of the wrong type
    /// - `InvalidRegex` for a pattern that does not compile
    pub fn merge<I, S>(specs: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (S, FieldSpec)>,
        S: Into<String>,
    {
        let specs: Vec<(String, FieldSpec)> =
            specs.into_iter().map(|(n, s)| (n.into(), s)).collect();
        if specs.len() > MAX_FIELDS {
            return Err(CoreError::SchemaTooLarge {
                count: specs.len(),
                max: MAX_FIELDS,
            });
        }

        let mut fields: Vec<(String, FieldRule)> = Vec::with_capacity(specs.len());
        for (name, spec) in specs {
            let rule = FieldRule::merge(&name, spec)?;
            match fields.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = rule,
                None => fields.push((name, rule)),
            }
        }
        Ok(Self { fields })
    }

    /// Parses and merges a JSON schema document such as
    /// `{"name": {"type": "string", "required": true}}`.
    ///
    /// Field order follows the document.
    ///
    /// # Errors
    ///
    /// Returns a codec error for malformed JSON, or any [`merge`](Self::merge)
    /// error.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let document: SchemaDocument = serde_json::from_str(text)
            .map_err(|e| CodecError::decoding_failed(format!("schema: {e}")))?;
        Self::merge(document.0)
    }

    /// Looks up the rule for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Iterates rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A schema document with its field order intact.
struct SchemaDocument(Vec<(String, FieldSpec)>);

impl<'de> Deserialize<'de> for SchemaDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = SchemaDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut fields = Vec::new();
                while let Some((name, spec)) = map.next_entry::<String, FieldSpec>()? {
                    fields.push((name, spec));
                }
                Ok(SchemaDocument(fields))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}
