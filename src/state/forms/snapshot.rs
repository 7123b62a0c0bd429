//! Snapshots of section data and dotted-path updates over them

use super::field::{FieldMap, FieldValue};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Immutable view of one section's data. Every update produces a new root.
pub type FormSnapshot = Arc<FieldMap>;

/// Create an empty snapshot
pub fn empty_snapshot() -> FormSnapshot {
    Arc::new(FieldMap::new())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("field path is empty")]
    Empty,
    #[error("field path '{0}' contains an empty segment")]
    EmptySegment(String),
}

/// A dot-delimited location of a leaf inside a snapshot,
/// e.g. `essential_indicators.turnover.value`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when the path names a top-level field
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    /// True when `prefix` names this path or one of its enclosing groups
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Produce a copy of `root` with the leaf at `path` set to `value`.
///
/// Every group on the path is copied (or created when missing); groups off the
/// path are shared with `root`. A non-group value sitting where the path needs
/// a group is replaced by a fresh group.
pub fn update_path(root: &FormSnapshot, path: &FieldPath, value: FieldValue) -> FormSnapshot {
    Arc::new(set_in(root, path.segments(), value))
}

fn set_in(map: &FieldMap, segments: &[String], value: FieldValue) -> FieldMap {
    let mut copy = map.clone();
    let Some((head, rest)) = segments.split_first() else {
        return copy;
    };

    if rest.is_empty() {
        copy.insert(head.clone(), value);
        return copy;
    }

    let child = match map.get(head) {
        Some(FieldValue::Group(group)) => set_in(group, rest, value),
        Some(other) => {
            tracing::debug!(segment = %head, ?other, "replacing leaf value with a group");
            set_in(&FieldMap::new(), rest, value)
        }
        None => set_in(&FieldMap::new(), rest, value),
    };
    copy.insert(head.clone(), FieldValue::Group(Arc::new(child)));
    copy
}

/// Read the value at `path`, if every segment resolves
pub fn get_path<'a>(root: &'a FieldMap, path: &FieldPath) -> Option<&'a FieldValue> {
    let (last, parents) = path.segments().split_last()?;
    let mut current = root;
    for segment in parents {
        current = current.get(segment)?.as_group()?;
    }
    current.get(last)
}

/// Deep-merge `overlay` onto `base`: overlay values win, groups present on
/// both sides are merged, and base entries missing from the overlay are kept.
pub fn merge_over(base: &FormSnapshot, overlay: &FieldMap) -> FormSnapshot {
    let mut merged = (**base).clone();
    for (key, value) in overlay {
        let next = match (base.get(key), value) {
            (Some(FieldValue::Group(b)), FieldValue::Group(o)) => {
                FieldValue::Group(merge_over(b, o))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    Arc::new(merged)
}
