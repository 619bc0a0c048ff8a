//! Record types the accessor is generic over.

use recordstore_storage::{Collection, Document, Schema, StorageError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A record type stored in one collection.
///
/// The type describes only the caller-defined fields; the identifier and
/// timestamps are carried by [`Stored`].
///
/// ```ignore
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Task {
///     title: String,
///     #[serde(default)]
///     done: bool,
/// }
///
/// impl Record for Task {
///     const COLLECTION: &'static str = "tasks";
///
///     fn schema() -> Schema {
///         Schema::new()
///             .field(FieldRule::required("title", FieldKind::String))
///             .field(FieldRule::optional("done", FieldKind::Boolean))
///     }
/// }
/// ```
pub trait Record: DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection holding records of this type.
    const COLLECTION: &'static str;

    /// Field constraints the store enforces. Accepts anything by default.
    fn schema() -> Schema {
        Schema::new()
    }

    /// The collection descriptor passed to the store.
    fn collection() -> Collection {
        Collection::new(Self::COLLECTION, Self::schema())
    }
}

/// A record together with its store-assigned identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(flatten)]
    pub record: T,
}

impl<T: Record> Stored<T> {
    /// Decodes a store document into a typed record.
    pub fn from_document(doc: Document) -> Result<Self, StorageError> {
        let Document {
            id,
            created_at,
            updated_at,
            fields,
        } = doc;

        let record = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            StorageError::decode(format!("{}/{id}: {e}", T::COLLECTION))
        })?;

        Ok(Self {
            id,
            created_at,
            updated_at,
            record,
        })
    }
}

impl<T> Stored<T> {
    /// Discards identity and timestamps.
    pub fn into_inner(self) -> T {
        self.record
    }
}
