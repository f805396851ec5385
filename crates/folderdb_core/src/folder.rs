//! The folder entity.

use crate::error::{CoreError, CoreResult};
use folderdb_store::{validate_segment, DocumentPath};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stored field holding the folder identifier.
pub const ID_FIELD: &str = "ID";
/// Stored field holding the logical parent identifier.
pub const PARENT_ID_FIELD: &str = "ParentID";
/// Stored field holding free-form metadata.
pub const METADATA_FIELD: &str = "Metadata";

/// Free-form folder metadata.
pub type Metadata = BTreeMap<String, String>;

/// A folder: a named node with an optional parent and metadata.
///
/// `parent_id` is empty for root folders. It is a denormalized field,
/// independent of where the folder document is physically stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Identifier, unique within the containing collection.
    #[serde(rename = "ID")]
    pub id: String,

    /// Logical parent identifier; empty for a root folder.
    #[serde(rename = "ParentID", default)]
    pub parent_id: String,

    /// Optional free-form metadata.
    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Folder {
    /// Creates a folder with the given identifier and parent.
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            metadata: None,
        }
    }

    /// Creates a root folder.
    pub fn root(id: impl Into<String>) -> Self {
        Self::new(id, "")
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns true if the folder has no logical parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_empty()
    }

    /// Checks the identifiers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFolder` if `id` is not a valid path segment, or if
    /// `parent_id` is neither empty nor a valid path segment.
    pub fn validate(&self) -> CoreResult<()> {
        validate_segment(&self.id)
            .map_err(|e| CoreError::invalid_folder(&self.id, e.to_string()))?;
        if !self.parent_id.is_empty() {
            validate_segment(&self.parent_id).map_err(|e| {
                CoreError::invalid_folder(&self.id, format!("parent id: {e}"))
            })?;
        }
        Ok(())
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ID={}, ParentID={}]", self.id, self.parent_id)
    }
}

/// Derives the logical parent of a nested folder from its storage path.
///
/// The parent is the document owning the folder's collection; a folder
/// in a root collection has no parent and gets an empty identifier.
#[must_use]
pub fn derive_parent_id(path: &DocumentPath) -> String {
    path.grandparent()
        .map(|parent| parent.id().to_string())
        .unwrap_or_default()
}

/// A folder together with the path it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFolder {
    /// Storage path of the folder document.
    pub path: DocumentPath,
    /// Decoded folder.
    pub folder: Folder,
}

impl StoredFolder {
    /// Returns true if the stored `ParentID` agrees with the storage path.
    #[must_use]
    pub fn is_linked_to_path(&self) -> bool {
        self.folder.parent_id == derive_parent_id(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folderdb_store::{from_fields, to_fields, Value};

    #[test]
    fn stored_field_names() {
        let folder = Folder::new("hockey", "sports");
        let fields = to_fields(&folder).unwrap();
        assert_eq!(fields.get(ID_FIELD), Some(&Value::Text("hockey".into())));
        assert_eq!(fields.get(PARENT_ID_FIELD), Some(&Value::Text("sports".into())));
        assert!(!fields.contains_key(METADATA_FIELD));
    }

    #[test]
    fn metadata_roundtrip() {
        let folder = Folder::root("sports").with_metadata("color", "green");
        let fields = to_fields(&folder).unwrap();
        assert!(fields.contains_key(METADATA_FIELD));
        let back: Folder = from_fields(&fields).unwrap();
        assert_eq!(back, folder);
    }

    #[test]
    fn missing_parent_decodes_as_root() {
        let mut fields = folderdb_store::Fields::new();
        fields.insert(ID_FIELD.into(), Value::Text("legacy".into()));
        let folder: Folder = from_fields(&fields).unwrap();
        assert!(folder.is_root());
    }

    #[test]
    fn display_format() {
        assert_eq!(
            Folder::new("hockey", "sports").to_string(),
            "[ID=hockey, ParentID=sports]"
        );
    }

    #[test]
    fn validation() {
        assert!(Folder::root("sports").validate().is_ok());
        assert!(Folder::new("hockey", "sports").validate().is_ok());
        assert!(Folder::root("").validate().is_err());
        assert!(Folder::root("a/b").validate().is_err());
        assert!(Folder::new("a", "x/y").validate().is_err());
    }

    #[test]
    fn parent_derivation() {
        let nested = DocumentPath::new("folders/sports/folders/hockey").unwrap();
        assert_eq!(derive_parent_id(&nested), "sports");

        let deeper = DocumentPath::new("folders/sports/folders/hockey/folders/nhl").unwrap();
        assert_eq!(derive_parent_id(&deeper), "hockey");

        let root = DocumentPath::new("folders/sports").unwrap();
        assert_eq!(derive_parent_id(&root), "");
    }

    #[test]
    fn path_linkage() {
        let stored = StoredFolder {
            path: DocumentPath::new("folders/sports/folders/hockey").unwrap(),
            folder: Folder::new("hockey", "sports"),
        };
        assert!(stored.is_linked_to_path());

        let stale = StoredFolder {
            folder: Folder::new("hockey", "music"),
            ..stored
        };
        assert!(!stale.is_linked_to_path());
    }
}
