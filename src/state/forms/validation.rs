//! Per-field validation messages

use std::collections::BTreeMap;

/// Field name to error message. A missing key means the field is valid.
pub type ErrorMap = BTreeMap<String, String>;

/// Tracks validation errors for a form.
///
/// `revision` only moves when the map actually changes, so clearing an
/// absent field does not count as a change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTracker {
    errors: ErrorMap,
    revision: u64,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the message for `field`
    pub fn set_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();
        if self.errors.get(&field) == Some(&message) {
            return;
        }
        self.errors.insert(field, message);
        self.revision += 1;
    }

    /// Remove the message for `field`. Returns true if one was removed.
    pub fn clear_error(&mut self, field: &str) -> bool {
        if self.errors.remove(field).is_some() {
            self.revision += 1;
            true
        } else {
            false
        }
    }

    pub fn clear_all(&mut self) {
        if !self.errors.is_empty() {
            self.errors.clear();
            self.revision += 1;
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
