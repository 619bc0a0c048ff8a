//! Collection schemas and field validation.
//!
//! A [`Schema`] is the store-side description of a collection's caller-defined
//! fields. Backends run [`Schema::validate`] on insert and, when requested,
//! on the merged result of an update.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::document::{CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
use crate::error::StorageError;

/// The JSON shape a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    /// An RFC 3339 timestamp string.
    Timestamp,
    Array,
    Object,
    Any,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Timestamp => value
                .as_str()
                .is_some_and(|s| OffsetDateTime::parse(s, &Rfc3339).is_ok()),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}

/// Constraints on a single top-level field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// Allowed values, if the field is an enumeration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
}

impl FieldRule {
    /// An optional field of the given kind.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            one_of: None,
        }
    }

    /// A required field of the given kind. `null` does not satisfy it.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            required: true,
            ..Self::optional(name, kind)
        }
    }

    /// Restricts the field to the given values.
    #[must_use]
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    fn check(&self, value: Option<&Value>, violations: &mut Vec<String>) {
        let value = match value {
            None | Some(Value::Null) => {
                if self.required {
                    violations.push(format!("{}: required", self.name));
                }
                return;
            }
            Some(value) => value,
        };

        if !self.kind.accepts(value) {
            violations.push(format!("{}: expected {}", self.name, self.kind));
            return;
        }

        if let Some(allowed) = &self.one_of
            && !allowed.contains(value)
        {
            violations.push(format!("{}: {} is not an allowed value", self.name, value));
        }
    }
}

/// Field constraints of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<FieldRule>,
    /// Reject fields that no rule describes.
    #[serde(default)]
    pub strict: bool,
}

impl Schema {
    /// Creates an empty schema accepting any fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field rule.
    #[must_use]
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Rejects undeclared fields.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Validates caller-defined fields, reporting every violation at once.
    pub fn validate(&self, fields: &Map<String, Value>) -> Result<(), StorageError> {
        let mut violations = Vec::new();

        for rule in &self.fields {
            rule.check(fields.get(&rule.name), &mut violations);
        }

        if self.strict {
            for key in fields.keys() {
                let reserved = matches!(key.as_str(), ID_FIELD | CREATED_AT_FIELD | UPDATED_AT_FIELD);
                if !reserved && !self.fields.iter().any(|rule| &rule.name == key) {
                    violations.push(format!("{key}: unknown field"));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(StorageError::validation(violations.join("; ")))
        }
    }
}

/// A named collection together with its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub schema: Schema,
}

impl Collection {
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// A collection without field constraints.
    #[must_use]
    pub fn schemaless(name: impl Into<String>) -> Self {
        Self::new(name, Schema::new())
    }
}
