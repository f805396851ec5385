//! Comparison of the flat and nested representations of one parent.

use std::collections::BTreeSet;
use std::fmt;

/// Children of one parent as seen by the two query shapes.
///
/// The flat query (`ParentID == parent` over the root collection) and the
/// subcollection listing are expected to agree, but the store does not
/// keep them in sync. This report shows where they diverge; it never
/// repairs anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Identifier of the parent folder.
    pub parent_id: String,
    /// Children found by both query shapes.
    pub in_both: BTreeSet<String>,
    /// Children only found by the flat `ParentID` query.
    pub flat_only: BTreeSet<String>,
    /// Children only found in the parent's subcollection.
    pub nested_only: BTreeSet<String>,
}

impl ConsistencyReport {
    /// Builds a report from the two identifier sets.
    pub fn compare(
        parent_id: impl Into<String>,
        flat: BTreeSet<String>,
        nested: BTreeSet<String>,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            in_both: flat.intersection(&nested).cloned().collect(),
            flat_only: flat.difference(&nested).cloned().collect(),
            nested_only: nested.difference(&flat).cloned().collect(),
        }
    }

    /// Returns true if both query shapes returned the same set.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.flat_only.is_empty() && self.nested_only.is_empty()
    }

    /// Number of children seen by the flat query.
    #[must_use]
    pub fn flat_count(&self) -> usize {
        self.in_both.len() + self.flat_only.len()
    }

    /// Number of children seen in the subcollection.
    #[must_use]
    pub fn nested_count(&self) -> usize {
        self.in_both.len() + self.nested_only.len()
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parent {:?}: {} in both, {} flat only, {} nested only",
            self.parent_id,
            self.in_both.len(),
            self.flat_only.len(),
            self.nested_only.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_sets_are_consistent() {
        let report = ConsistencyReport::compare("p", set(&["a", "b"]), set(&["b", "a"]));
        assert!(report.is_consistent());
        assert_eq!(report.in_both.len(), 2);
    }

    #[test]
    fn divergence_is_split() {
        let report = ConsistencyReport::compare("p", set(&["a", "b"]), set(&["b", "c"]));
        assert!(!report.is_consistent());
        assert_eq!(report.in_both, set(&["b"]));
        assert_eq!(report.flat_only, set(&["a"]));
        assert_eq!(report.nested_only, set(&["c"]));
        assert_eq!(report.flat_count(), 2);
        assert_eq!(report.nested_count(), 2);
    }

    #[test]
    fn empty_is_consistent() {
        assert!(ConsistencyReport::default().is_consistent());
    }
}
