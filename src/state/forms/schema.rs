//! Known field paths of a section

use super::field::{FieldDescriptor, FieldValue};
use super::snapshot::FieldPath;
use std::collections::BTreeSet;

/// The set of leaf paths a section is allowed to write.
///
/// A write is accepted when its path names a known leaf, or names one of
/// the groups enclosing a known leaf and the value is itself a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSchema {
    leaves: BTreeSet<FieldPath>,
}

impl PathSchema {
    pub fn new(leaves: impl IntoIterator<Item = FieldPath>) -> Self {
        Self {
            leaves: leaves.into_iter().collect(),
        }
    }

    /// Build the schema from field descriptors; descriptors with a malformed
    /// path are skipped with a warning.
    pub fn from_fields(fields: &[FieldDescriptor]) -> Self {
        let leaves = fields.iter().filter_map(|field| match FieldPath::parse(&field.path) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(path = %field.path, error = %e, "skipping malformed field path");
                None
            }
        });
        Self::new(leaves)
    }

    pub fn allows(&self, path: &FieldPath, value: &FieldValue) -> bool {
        if self.leaves.contains(path) {
            return true;
        }
        value.as_group().is_some() && self.leaves.iter().any(|leaf| leaf.starts_with(path))
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}
