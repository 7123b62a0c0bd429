//! Form state container for one section snapshot

use super::field::FieldValue;
use super::schema::PathSchema;
use super::snapshot::{get_path, update_path, FieldPath, FormSnapshot, PathError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by field updates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("'{0}' is not a top-level field")]
    NotTopLevel(String),
    #[error("unknown field '{0}'")]
    UnknownPath(String),
    #[error("section is read-only")]
    ReadOnly,
    #[error("section data has not loaded yet")]
    NotLoaded,
}

type Observer = Box<dyn FnMut(&FormSnapshot) + Send>;

/// Holds the latest snapshot of a section and the baseline it is compared to.
///
/// Observers are called once per applied change with the complete new snapshot.
pub struct FormState {
    initial: FormSnapshot,
    current: FormSnapshot,
    schema: Option<PathSchema>,
    observers: Vec<Observer>,
    revision: u64,
}

impl FormState {
    /// Container that accepts any path
    pub fn new(initial: FormSnapshot) -> Self {
        Self {
            current: Arc::clone(&initial),
            initial,
            schema: None,
            observers: Vec::new(),
            revision: 0,
        }
    }

    /// Container that rejects paths outside `schema`
    pub fn with_schema(initial: FormSnapshot, schema: PathSchema) -> Self {
        Self {
            schema: Some(schema),
            ..Self::new(initial)
        }
    }

    pub fn snapshot(&self) -> &FormSnapshot {
        &self.current
    }

    pub fn initial(&self) -> &FormSnapshot {
        &self.initial
    }

    /// Number of changes applied since construction
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when the current snapshot differs from the baseline
    pub fn is_dirty(&self) -> bool {
        !Arc::ptr_eq(&self.current, &self.initial) && self.current != self.initial
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&FormSnapshot) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        get_path(&self.current, path)
    }

    /// Set a top-level field
    pub fn update_field(&mut self, name: &str, value: FieldValue) -> Result<(), FormError> {
        let path = FieldPath::parse(name)?;
        if !path.is_top_level() {
            return Err(FormError::NotTopLevel(name.to_string()));
        }
        self.set(&path, value)
    }

    /// Set the leaf at a dotted path
    pub fn update_nested_field(&mut self, path: &str, value: FieldValue) -> Result<(), FormError> {
        let path = FieldPath::parse(path)?;
        self.set(&path, value)
    }

    pub fn set(&mut self, path: &FieldPath, value: FieldValue) -> Result<(), FormError> {
        if let Some(schema) = &self.schema {
            if !schema.allows(path, &value) {
                return Err(FormError::UnknownPath(path.to_string()));
            }
        }
        let next = update_path(&self.current, path, value);
        self.commit(next);
        Ok(())
    }

    /// Make `baseline` the snapshot that `reset` restores and `is_dirty`
    /// compares against. The current snapshot is untouched.
    pub fn rebase(&mut self, baseline: FormSnapshot) {
        self.initial = baseline;
    }

    /// Restore the baseline snapshot
    pub fn reset(&mut self) {
        let initial = Arc::clone(&self.initial);
        self.commit(initial);
    }

    fn commit(&mut self, next: FormSnapshot) {
        self.current = next;
        self.revision += 1;
        for observer in self.observers.iter_mut() {
            observer(&self.current);
        }
    }
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("current", &self.current)
            .field("schema", &self.schema)
            .field("observers", &self.observers.len())
            .field("revision", &self.revision)
            .finish()
    }
}
