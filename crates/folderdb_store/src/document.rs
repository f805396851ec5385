//! Documents and field filters.

use crate::error::{StoreError, StoreResult};
use crate::path::DocumentPath;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

pub use ciborium::Value;

/// Field name to value mapping of a document.
pub type Fields = BTreeMap<String, Value>;

/// Maximum encoded size of a single document (1 MiB).
pub const MAX_DOCUMENT_SIZE: usize = 1024 * 1024;

/// Encodes any serializable value into document fields.
///
/// The value must serialize to a map with string keys.
///
/// # Errors
///
/// Returns a codec error if serialization fails or the value is not a map.
pub fn to_fields<T: Serialize + ?Sized>(value: &T) -> StoreResult<Fields> {
    match Value::serialized(value).map_err(StoreError::codec)? {
        Value::Map(entries) => entries
            .into_iter()
            .map(|(key, value)| match key {
                Value::Text(name) => Ok((name, value)),
                other => Err(StoreError::codec(format!(
                    "field name must be text, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(StoreError::codec(format!(
            "document must serialize to a map, got {other:?}"
        ))),
    }
}

/// Decodes document fields into a typed value.
///
/// # Errors
///
/// Returns a codec error if the fields do not match `T`.
pub fn from_fields<T: DeserializeOwned>(fields: &Fields) -> StoreResult<T> {
    let map = Value::Map(
        fields
            .iter()
            .map(|(name, value)| (Value::Text(name.clone()), value.clone()))
            .collect(),
    );
    map.deserialized().map_err(StoreError::codec)
}

/// Returns the canonical CBOR size of `fields` in bytes.
///
/// # Errors
///
/// Returns a codec error if encoding fails.
pub fn encoded_size(fields: &Fields) -> StoreResult<usize> {
    let mut buf = Vec::new();
    ciborium::into_writer(fields, &mut buf).map_err(StoreError::codec)?;
    Ok(buf.len())
}

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    path: DocumentPath,
    fields: Fields,
    version: u64,
}

impl Document {
    /// Creates a document snapshot.
    #[must_use]
    pub fn new(path: DocumentPath, fields: Fields, version: u64) -> Self {
        Self {
            path,
            fields,
            version,
        }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Returns the document identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Returns all fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns one field, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the commit version that last wrote this document.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Decodes the document into a typed value.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        from_fields(&self.fields)
    }
}

/// An equality filter on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field: String,
    value: Value,
    match_missing: bool,
}

impl FieldFilter {
    /// Matches documents whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            match_missing: false,
        }
    }

    /// Matches documents whose `field` equals the text `value`.
    pub fn eq_text(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::eq(field, Value::Text(value.into()))
    }

    /// Also matches documents that lack the field.
    #[must_use]
    pub fn or_missing(mut self) -> Self {
        self.match_missing = true;
        self
    }

    /// Returns the filtered field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the expected value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns true if `fields` satisfies the filter.
    ///
    /// A document without the field matches only after [`FieldFilter::or_missing`].
    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        match fields.get(&self.field) {
            Some(value) => *value == self.value,
            None => self.match_missing,
        }
    }
}
