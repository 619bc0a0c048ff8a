//! The stored document shape shared by every backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::StorageError;

/// Key of the document identifier.
pub const ID_FIELD: &str = "id";
/// Key of the store-assigned creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Key of the store-assigned last modification timestamp.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A document as held by the store.
///
/// `id`, `createdAt` and `updatedAt` are managed by the store; everything
/// else lives in `fields` and is described by the collection schema.
/// Serializes as one flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Creates a freshly inserted document.
    #[must_use]
    pub fn new(id: impl Into<String>, created_at: OffsetDateTime, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            created_at,
            updated_at: created_at,
            fields,
        }
    }

    /// Returns a caller-defined field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the document as a flat JSON object.
    pub fn to_value(&self) -> Result<Value, StorageError> {
        serde_json::to_value(self).map_err(|e| StorageError::internal(e.to_string()))
    }

    /// Applies a partial update with top-level `$set` semantics.
    ///
    /// Store-managed timestamps in the patch are ignored and `updatedAt` is
    /// moved to `now`. The identifier cannot change.
    pub fn apply_patch(&mut self, patch: &Value, now: OffsetDateTime) -> Result<(), StorageError> {
        let patch = patch
            .as_object()
            .ok_or_else(|| StorageError::validation("update must be a JSON object"))?;

        for (key, value) in patch {
            match key.as_str() {
                ID_FIELD => {
                    if value.as_str() != Some(self.id.as_str()) {
                        return Err(StorageError::validation("id: field is immutable"));
                    }
                }
                CREATED_AT_FIELD | UPDATED_AT_FIELD => {}
                _ => {
                    self.fields.insert(key.clone(), value.clone());
                }
            }
        }

        self.updated_at = now;
        Ok(())
    }
}

/// Splits insert input into an optional caller-chosen ID and the
/// caller-defined fields. Store-managed timestamps are dropped.
pub fn split_insert_fields(input: &Value) -> Result<(Option<String>, Map<String, Value>), StorageError> {
    let mut fields = input
        .as_object()
        .cloned()
        .ok_or_else(|| StorageError::validation("document must be a JSON object"))?;

    let id = match fields.remove(ID_FIELD) {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        Some(_) => return Err(StorageError::validation("id: must be a non-empty string")),
    };

    fields.remove(CREATED_AT_FIELD);
    fields.remove(UPDATED_AT_FIELD);

    Ok((id, fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn sample() -> Document {
        let fields = json!({"title": "write report", "done": false});
        Document::new(
            "task-1",
            datetime!(2024-01-02 10:00:00 UTC),
            fields.as_object().cloned().unwrap(),
        )
    }

    #[test]
    fn test_document_serializes_flat() {
        let value = sample().to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "id": "task-1",
                "createdAt": "2024-01-02T10:00:00Z",
                "updatedAt": "2024-01-02T10:00:00Z",
                "title": "write report",
                "done": false
            })
        );

        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, sample());
        assert!(!back.fields.contains_key(ID_FIELD));
    }

    #[test]
    fn test_apply_patch_sets_fields_and_touches_updated_at() {
        let mut doc = sample();
        let now = datetime!(2024-01-03 08:00:00 UTC);
        doc.apply_patch(&json!({"done": true, "priority": 2}), now)
            .unwrap();

        assert_eq!(doc.get("done"), Some(&json!(true)));
        assert_eq!(doc.get("priority"), Some(&json!(2)));
        assert_eq!(doc.get("title"), Some(&json!("write report")));
        assert_eq!(doc.updated_at, now);
        assert_eq!(doc.created_at, datetime!(2024-01-02 10:00:00 UTC));
    }

    #[test]
    fn test_apply_patch_ignores_timestamps() {
        let mut doc = sample();
        doc.apply_patch(
            &json!({"createdAt": "1999-01-01T00:00:00Z", "id": "task-1"}),
            datetime!(2024-01-03 08:00:00 UTC),
        )
        .unwrap();
        assert_eq!(doc.created_at, datetime!(2024-01-02 10:00:00 UTC));
        assert!(!doc.fields.contains_key(CREATED_AT_FIELD));
    }

    #[test]
    fn test_apply_patch_rejects_id_change_and_non_objects() {
        let mut doc = sample();
        let now = datetime!(2024-01-03 08:00:00 UTC);
        assert!(doc.apply_patch(&json!({"id": "other"}), now).unwrap_err().is_validation());
        assert!(doc.apply_patch(&json!([1, 2]), now).unwrap_err().is_validation());
    }

    #[test]
    fn test_split_insert_fields() {
        let (id, fields) = split_insert_fields(&json!({
            "id": "custom",
            "createdAt": "2020-01-01T00:00:00Z",
            "title": "x"
        }))
        .unwrap();
        assert_eq!(id.as_deref(), Some("custom"));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("title"), Some(&json!("x")));

        let (id, _) = split_insert_fields(&json!({"title": "x"})).unwrap();
        assert!(id.is_none());

        assert!(split_insert_fields(&json!({"id": 5})).unwrap_err().is_validation());
        assert!(split_insert_fields(&json!({"id": ""})).unwrap_err().is_validation());
        assert!(split_insert_fields(&json!("title")).unwrap_err().is_validation());
    }
}
