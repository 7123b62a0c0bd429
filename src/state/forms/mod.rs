//! Form domain layer
//!
//! Snapshots of section data, path updates over them, validation errors,
//! the save lifecycle, and the section form that ties them together.

mod field;
mod form_state;
mod schema;
mod section;
mod snapshot;
mod submission;
mod validation;

pub use field::{FieldDescriptor, FieldKind, FieldMap, FieldValue};
pub use form_state::{FormError, FormState};
pub use schema::PathSchema;
pub use section::{
    FieldCheck, FieldRule, PersistedField, SectionForm, SectionPhase, SectionSpec,
};
pub use snapshot::{
    empty_snapshot, get_path, merge_over, update_path, FieldPath, FormSnapshot, PathError,
};
pub use submission::{
    SubmissionState, SubmitOutcome, Submitter, SAVE_FAILURE_FALLBACK, SAVE_SUCCESS_MESSAGE,
};
pub use validation::{ErrorMap, ErrorTracker};
