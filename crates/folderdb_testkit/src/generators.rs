//! Property-based test generators using proptest.
//!
//! Provides strategies for generating folder identifiers, folders and
//! storage paths that are always valid.

use folderdb_core::{Folder, Metadata};
use folderdb_store::DocumentPath;
use proptest::prelude::*;

/// Strategy for generating valid folder identifiers.
pub fn folder_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9_-]{0,23}").expect("Invalid regex")
}

/// Strategy for generating a parent identifier, empty for roots.
pub fn parent_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        3 => folder_id_strategy(),
    ]
}

/// Strategy for generating small metadata maps.
pub fn metadata_strategy() -> impl Strategy<Value = Metadata> {
    prop::collection::btree_map(
        prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
        prop::string::string_regex("[ -~]{0,16}").expect("Invalid regex"),
        0..4,
    )
}

/// Strategy for generating flat folders.
pub fn folder_strategy() -> impl Strategy<Value = Folder> {
    (
        folder_id_strategy(),
        parent_id_strategy(),
        prop::option::of(metadata_strategy()),
    )
        .prop_map(|(id, parent_id, metadata)| Folder {
            id,
            parent_id,
            metadata,
        })
}

/// Strategy for generating nested folder paths.
///
/// Every collection segment is `folders`; `depth` counts folder levels.
pub fn nested_path_strategy(depth: std::ops::Range<usize>) -> impl Strategy<Value = DocumentPath> {
    prop::collection::vec(folder_id_strategy(), depth).prop_map(|ids| {
        let path = ids
            .iter()
            .map(|id| format!("folders/{id}"))
            .collect::<Vec<_>>()
            .join("/");
        DocumentPath::new(path).expect("Generated path should be valid")
    })
}

/// Strategy for generating a set of distinct folder identifiers.
pub fn distinct_ids_strategy(
    size: std::ops::Range<usize>,
) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(folder_id_strategy(), size)
        .prop_map(|ids| ids.into_iter().collect())
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folderdb_store::validate_segment;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn folder_ids_are_valid_segments(id in folder_id_strategy()) {
            prop_assert!(validate_segment(&id).is_ok());
        }

        #[test]
        fn generated_folders_validate(folder in folder_strategy()) {
            prop_assert!(folder.validate().is_ok());
        }

        #[test]
        fn nested_paths_have_requested_depth(path in nested_path_strategy(1..5)) {
            prop_assert!(path.depth() < 4);
        }
    }
}
