//! Report section form: one BRSR section's editable data and save lifecycle

use super::field::{FieldDescriptor, FieldKind, FieldMap, FieldValue};
use super::form_state::{FormError, FormState};
use super::schema::PathSchema;
use super::snapshot::{
    empty_snapshot, get_path, merge_over, update_path, FieldPath, FormSnapshot,
};
use super::submission::{SubmissionState, SubmitOutcome, Submitter};
use super::validation::ErrorTracker;
use crate::state::{ReportData, SavePayload};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;

/// A check applied to one field before saving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Required,
    NonNegativeNumber,
}

impl FieldRule {
    /// Error message for `value`, or `None` if it passes
    pub fn check(self, value: Option<&FieldValue>) -> Option<&'static str> {
        let value = value.unwrap_or(&FieldValue::Null);
        match self {
            FieldRule::Required => value.is_blank().then_some("This field is required"),
            FieldRule::NonNegativeNumber => {
                if value.is_blank() {
                    return None;
                }
                match value.as_number() {
                    None => Some("Must be a number"),
                    Some(n) if n < 0.0 => Some("Must not be negative"),
                    Some(_) => None,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub path: String,
    pub rule: FieldRule,
}

impl FieldCheck {
    pub fn required(path: &str) -> Self {
        Self {
            path: path.to_string(),
            rule: FieldRule::Required,
        }
    }
}

/// Maps a report field name to the top-level snapshot key holding its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedField {
    pub persisted_key: String,
    pub snapshot_key: String,
}

impl PersistedField {
    pub fn new(persisted_key: &str, snapshot_key: &str) -> Self {
        Self {
            persisted_key: persisted_key.to_string(),
            snapshot_key: snapshot_key.to_string(),
        }
    }
}

/// Configuration of one section form
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSpec {
    /// Short identifier, e.g. `p4`
    pub key: String,
    pub title: String,
    pub persisted: Vec<PersistedField>,
    pub fields: Vec<FieldDescriptor>,
    pub checks: Vec<FieldCheck>,
}

impl SectionSpec {
    pub fn schema(&self) -> PathSchema {
        PathSchema::from_fields(&self.fields)
    }

    /// Snapshot of a section nobody has filled in yet
    pub fn default_snapshot(&self) -> FormSnapshot {
        let mut snapshot = empty_snapshot();
        for persisted in &self.persisted {
            if let Ok(path) = FieldPath::parse(&persisted.snapshot_key) {
                snapshot = update_path(&snapshot, &path, FieldValue::empty_group());
            }
        }
        for field in &self.fields {
            if let Ok(path) = FieldPath::parse(&field.path) {
                snapshot = update_path(&snapshot, &path, field.kind.default_value());
            }
        }
        snapshot
    }

    /// Default snapshot overlaid with whatever the report already stores
    pub fn seed(&self, report: &ReportData) -> FormSnapshot {
        let mut snapshot = self.default_snapshot();
        for persisted in &self.persisted {
            let Some(stored) = report.fields.get(&persisted.persisted_key) else {
                continue;
            };
            let mut overlay = FieldMap::new();
            overlay.insert(persisted.snapshot_key.clone(), stored.clone());
            snapshot = merge_over(&snapshot, &overlay);
        }
        snapshot
    }

    /// `snapshot` with every field in the form it is persisted in
    pub fn committed(&self, snapshot: &FormSnapshot) -> FormSnapshot {
        let mut committed = Arc::clone(snapshot);
        for field in &self.fields {
            let Ok(path) = FieldPath::parse(&field.path) else {
                continue;
            };
            let Some(value) = get_path(&committed, &path) else {
                continue;
            };
            let next = field.kind.committed(value);
            if &next != value {
                committed = update_path(&committed, &path, next);
            }
        }
        committed
    }

    /// Copy of the section data keyed by persisted field names
    pub fn payload(&self, snapshot: &FormSnapshot) -> SavePayload {
        let snapshot = self.committed(snapshot);
        self.persisted
            .iter()
            .map(|p| {
                let value = snapshot
                    .get(&p.snapshot_key)
                    .cloned()
                    .unwrap_or_else(FieldValue::empty_group);
                (p.persisted_key.clone(), value)
            })
            .collect()
    }

    /// Explicit checks plus a numeric check for every number field
    pub fn all_checks(&self) -> Vec<FieldCheck> {
        let mut checks = self.checks.clone();
        checks.extend(
            self.fields
                .iter()
                .filter(|f| f.kind == FieldKind::Number)
                .map(|f| FieldCheck {
                    path: f.path.clone(),
                    rule: FieldRule::NonNegativeNumber,
                }),
        );
        checks
    }
}

/// Lifecycle of a section form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPhase {
    /// No report data has arrived yet
    Loading,
    Editable,
    /// The report has been submitted; data is readable but frozen
    ReadOnly,
}

/// One section of the report: snapshot, validation errors and save status.
#[derive(Debug)]
pub struct SectionForm {
    spec: Arc<SectionSpec>,
    form: Option<FormState>,
    submitted: bool,
    errors: ErrorTracker,
    submitter: Submitter,
    active_field_index: usize,
    last_saved_at: Option<DateTime<Utc>>,
}

impl SectionForm {
    pub fn new(spec: Arc<SectionSpec>) -> Self {
        Self {
            spec,
            form: None,
            submitted: false,
            errors: ErrorTracker::new(),
            submitter: Submitter::new(),
            active_field_index: 0,
            last_saved_at: None,
        }
    }

    pub fn spec(&self) -> &SectionSpec {
        &self.spec
    }

    pub fn phase(&self) -> SectionPhase {
        match (&self.form, self.submitted) {
            (None, _) => SectionPhase::Loading,
            (Some(_), true) => SectionPhase::ReadOnly,
            (Some(_), false) => SectionPhase::Editable,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.phase() == SectionPhase::ReadOnly
    }

    pub fn snapshot(&self) -> Option<&FormSnapshot> {
        self.form.as_ref().map(FormState::snapshot)
    }

    pub fn value(&self, path: &str) -> Option<&FieldValue> {
        let path = FieldPath::parse(path).ok()?;
        get_path(self.snapshot()?, &path)
    }

    pub fn errors(&self) -> &ErrorTracker {
        &self.errors
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submitter.state()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Whether the save trigger should be offered
    pub fn can_save(&self) -> bool {
        self.phase() == SectionPhase::Editable && !self.submitter.is_in_flight()
    }

    pub fn is_dirty(&self) -> bool {
        self.form.as_ref().is_some_and(FormState::is_dirty)
    }

    /// Edits made since the section was loaded or last saved
    pub fn has_unsaved_changes(&self) -> bool {
        self.is_dirty()
    }

    /// Seed the form from freshly fetched report data.
    ///
    /// `None` means the data is still on its way and leaves the form as is.
    pub fn load_report(&mut self, report: Option<&ReportData>) {
        let Some(report) = report else {
            tracing::debug!(section = %self.spec.key, "no report data yet");
            return;
        };
        let seed = self.spec.seed(report);
        self.form = Some(FormState::with_schema(seed, self.spec.schema()));
        self.errors.clear_all();
        self.set_submitted(report.is_submitted);
        tracing::debug!(section = %self.spec.key, phase = ?self.phase(), "section loaded");
    }

    /// Observe the report's submitted flag. Once set it is never cleared.
    pub fn set_submitted(&mut self, submitted: bool) {
        if submitted && !self.submitted {
            tracing::info!(section = %self.spec.key, "section is now read-only");
            self.submitted = true;
        }
    }

    fn editable_form(&mut self) -> Result<&mut FormState, FormError> {
        if self.submitted && self.form.is_some() {
            return Err(FormError::ReadOnly);
        }
        self.form.as_mut().ok_or(FormError::NotLoaded)
    }

    pub fn update_field(&mut self, name: &str, value: FieldValue) -> Result<(), FormError> {
        self.editable_form()?.update_field(name, value)?;
        self.errors.clear_error(name);
        Ok(())
    }

    pub fn update_nested_field(&mut self, path: &str, value: FieldValue) -> Result<(), FormError> {
        self.editable_form()?.update_nested_field(path, value)?;
        self.errors.clear_error(path);
        Ok(())
    }

    /// Discard edits since the form was loaded or last saved
    pub fn reset(&mut self) -> Result<(), FormError> {
        self.editable_form()?.reset();
        self.errors.clear_all();
        Ok(())
    }

    // Field cursor

    pub fn active_field(&self) -> usize {
        self.active_field_index
    }

    pub fn active_descriptor(&self) -> Option<&FieldDescriptor> {
        self.spec.fields.get(self.active_field_index)
    }

    pub fn next_field(&mut self) {
        let count = self.spec.fields.len();
        if count > 0 {
            self.active_field_index = (self.active_field_index + 1) % count;
        }
    }

    pub fn prev_field(&mut self) {
        let count = self.spec.fields.len();
        if count == 0 {
            return;
        }
        if self.active_field_index == 0 {
            self.active_field_index = count - 1;
        } else {
            self.active_field_index -= 1;
        }
    }

    // Editing helpers for the active field

    fn edit_active(
        &mut self,
        edit: impl FnOnce(FieldKind, &FieldValue) -> Option<FieldValue>,
    ) -> Result<bool, FormError> {
        let Some(field) = self.active_descriptor().cloned() else {
            return Ok(false);
        };
        let current = self.value(&field.path).cloned().unwrap_or_default();
        match edit(field.kind, &current) {
            Some(next) => {
                self.update_nested_field(&field.path, next)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Type a character into the active field. Returns false if it was ignored.
    pub fn input_char(&mut self, c: char) -> Result<bool, FormError> {
        self.edit_active(|kind, current| kind.push_char(current, c))
    }

    pub fn backspace(&mut self) -> Result<bool, FormError> {
        self.edit_active(|kind, current| kind.pop_char(current))
    }

    /// Flip the active field if it is a yes/no field
    pub fn toggle_flag(&mut self) -> Result<bool, FormError> {
        self.edit_active(|kind, current| {
            (kind == FieldKind::Flag).then(|| FieldValue::Flag(!current.as_flag()))
        })
    }

    /// Run every field check, replacing previous validation errors
    pub fn validate(&mut self) -> bool {
        self.errors.clear_all();
        let Some(snapshot) = self.snapshot().cloned() else {
            return false;
        };
        for check in self.spec.all_checks() {
            let value = FieldPath::parse(&check.path)
                .ok()
                .and_then(|path| get_path(&snapshot, &path));
            if let Some(message) = check.rule.check(value) {
                self.errors.set_error(check.path.clone(), message);
            }
        }
        !self.errors.has_errors()
    }

    /// Validate and hand a copy of the section data to `save_progress`.
    ///
    /// A failed save also reports its message through `on_error` so the
    /// wizard can surface it.
    pub async fn save<F, Fut>(&mut self, save_progress: F, on_error: impl FnOnce(&str)) -> SubmitOutcome
    where
        F: FnOnce(SavePayload) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        if self.phase() != SectionPhase::Editable {
            tracing::debug!(section = %self.spec.key, phase = ?self.phase(), "save ignored");
            return SubmitOutcome::Rejected;
        }
        if !self.validate() {
            tracing::info!(
                section = %self.spec.key,
                errors = self.errors.len(),
                "save blocked by validation"
            );
            self.submitter.clear_message();
            return SubmitOutcome::Invalid;
        }
        let Some(snapshot) = self.snapshot().cloned() else {
            return SubmitOutcome::Rejected;
        };
        let payload = self.spec.payload(&snapshot);

        let outcome = self
            .submitter
            .handle_submit(move || save_progress(payload))
            .await;

        match outcome {
            SubmitOutcome::Saved => {
                self.last_saved_at = Some(Utc::now());
                if let Some(form) = self.form.as_mut() {
                    form.rebase(snapshot);
                }
            }
            SubmitOutcome::Failed => {
                if let SubmissionState::Failed(message) = self.submitter.state() {
                    on_error(&message);
                }
            }
            _ => {}
        }
        outcome
    }
}
