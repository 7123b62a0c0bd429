//! Form field value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mapping of field names to values inside a group
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A value stored in a report section snapshot.
///
/// Groups are reference counted so that snapshots derived from one another
/// share every branch that was not touched by an update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<FieldValue>),
    Group(Arc<FieldMap>),
}

impl FieldValue {
    /// An empty nested group
    pub fn empty_group() -> Self {
        FieldValue::Group(Arc::new(FieldMap::new()))
    }

    pub fn as_group(&self) -> Option<&Arc<FieldMap>> {
        match self {
            FieldValue::Group(map) => Some(map),
            _ => None,
        }
    }

    /// Get the text value (returns empty string for non-text values)
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            _ => "",
        }
    }

    /// Numeric reading of the value; text is parsed leniently
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    /// True for null, whitespace-only text and empty groups
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Group(map) => map.is_empty(),
            FieldValue::Flag(_) | FieldValue::Number(_) => false,
        }
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Flag(true) => "Yes".to_string(),
            FieldValue::Flag(false) => "No".to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => format!("[{} items]", items.len()),
            FieldValue::Group(map) => format!("{{{} fields}}", map.len()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(value: FieldMap) -> Self {
        FieldValue::Group(Arc::new(value))
    }
}

/// How a field is edited and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Multiline,
    Number,
    Flag,
}

impl FieldKind {
    /// Value a freshly created section holds for this kind of field
    pub fn default_value(self) -> FieldValue {
        match self {
            FieldKind::Text | FieldKind::Multiline => FieldValue::Text(String::new()),
            FieldKind::Number => FieldValue::Null,
            FieldKind::Flag => FieldValue::Flag(false),
        }
    }

    /// Value after typing `c` into a field holding `current`.
    /// Returns `None` when the character is not accepted.
    pub fn push_char(self, current: &FieldValue, c: char) -> Option<FieldValue> {
        match self {
            FieldKind::Text | FieldKind::Multiline => {
                let mut s = current.display_value();
                s.push(c);
                Some(FieldValue::Text(s))
            }
            FieldKind::Number => {
                let mut s = current.display_value();
                let accepted = c.is_ascii_digit()
                    || (c == '.' && !s.contains('.'))
                    || (c == '-' && s.is_empty());
                if !accepted {
                    return None;
                }
                s.push(c);
                Some(number_from_input(s))
            }
            FieldKind::Flag => None,
        }
    }

    /// Value as it is sent to the server. Number fields turn numeric text
    /// into a number and blank text into null; anything else is kept.
    pub fn committed(self, value: &FieldValue) -> FieldValue {
        match (self, value) {
            (FieldKind::Number, FieldValue::Text(s)) if s.trim().is_empty() => FieldValue::Null,
            (FieldKind::Number, FieldValue::Text(s)) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => FieldValue::Number(n),
                _ => value.clone(),
            },
            _ => value.clone(),
        }
    }

    /// Value after deleting the last character
    pub fn pop_char(self, current: &FieldValue) -> Option<FieldValue> {
        match self {
            FieldKind::Text | FieldKind::Multiline => {
                let mut s = current.display_value();
                s.pop();
                Some(FieldValue::Text(s))
            }
            FieldKind::Number => {
                let mut s = current.display_value();
                s.pop();
                Some(number_from_input(s))
            }
            // Flags are toggled, not typed
            FieldKind::Flag => None,
        }
    }
}

/// Keep partially typed numbers (`"12."`, `"-"`) as text until they read back
/// unchanged as a number.
fn number_from_input(s: String) -> FieldValue {
    if s.is_empty() {
        return FieldValue::Null;
    }
    match s.parse::<f64>() {
        Ok(n) if n.to_string() == s => FieldValue::Number(n),
        _ => FieldValue::Text(s),
    }
}

/// Describes a single form field: where it lives in the snapshot and how it is shown
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub path: String,
    pub label: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    fn new(path: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            path: path.to_string(),
            label: label.to_string(),
            kind,
        }
    }

    /// Create a new single-line text field
    pub fn text(path: &str, label: &str) -> Self {
        Self::new(path, label, FieldKind::Text)
    }

    /// Create a new multi-line text field
    pub fn multiline(path: &str, label: &str) -> Self {
        Self::new(path, label, FieldKind::Multiline)
    }

    /// Create a new numeric field
    pub fn number(path: &str, label: &str) -> Self {
        Self::new(path, label, FieldKind::Number)
    }

    /// Create a new yes/no field
    pub fn flag(path: &str, label: &str) -> Self {
        Self::new(path, label, FieldKind::Flag)
    }

    pub fn is_multiline(&self) -> bool {
        self.kind == FieldKind::Multiline
    }
}
