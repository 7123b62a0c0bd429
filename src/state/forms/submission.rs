//! Save lifecycle tracking for a form

use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Message shown after a successful save
pub const SAVE_SUCCESS_MESSAGE: &str = "Progress saved successfully";
/// Message shown when a failed save carries no message of its own
pub const SAVE_FAILURE_FALLBACK: &str = "Failed to save progress";

/// Where the last save attempt stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Succeeded(String),
    Failed(String),
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::InFlight)
    }

    /// The success or failure message to display, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionState::Succeeded(m) | SubmissionState::Failed(m) => Some(m),
            SubmissionState::Idle | SubmissionState::InFlight => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SubmissionState::Failed(_))
    }
}

/// Result of asking a form to save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The save action completed
    Saved,
    /// The save action returned an error; the message is in the state
    Failed,
    /// Another save was still running; nothing was invoked
    AlreadyInFlight,
    /// Validation failed; nothing was invoked
    Invalid,
    /// The form does not accept saves (loading or read-only)
    Rejected,
}

impl SubmitOutcome {
    pub fn succeeded(self) -> bool {
        self == SubmitOutcome::Saved
    }
}

/// Runs save actions one at a time and records how each one ended.
///
/// Errors from the action never escape; they become `SubmissionState::Failed`.
#[derive(Debug)]
pub struct Submitter {
    state: Mutex<SubmissionState>,
    success_message: String,
}

impl Default for Submitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Submitter {
    pub fn new() -> Self {
        Self::with_success_message(SAVE_SUCCESS_MESSAGE)
    }

    pub fn with_success_message(message: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SubmissionState::Idle),
            success_message: message.into(),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.lock().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().is_in_flight()
    }

    /// Drop the message left by the previous attempt. An in-flight save is
    /// left alone.
    pub fn clear_message(&self) {
        let mut state = self.lock();
        if !state.is_in_flight() {
            *state = SubmissionState::Idle;
        }
    }

    /// Run `action` once, tracking it as the in-flight save.
    ///
    /// A call made while another is in flight returns
    /// `SubmitOutcome::AlreadyInFlight` without running its action.
    pub async fn handle_submit<F, Fut, E>(&self, action: F) -> SubmitOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        {
            let mut state = self.lock();
            if state.is_in_flight() {
                tracing::warn!("save requested while another save is in flight");
                return SubmitOutcome::AlreadyInFlight;
            }
            *state = SubmissionState::InFlight;
        }
        let guard = InFlightGuard { state: &self.state };

        let result = action().await;

        let (next, outcome) = match result {
            Ok(()) => {
                tracing::info!("save completed");
                (
                    SubmissionState::Succeeded(self.success_message.clone()),
                    SubmitOutcome::Saved,
                )
            }
            Err(e) => {
                let message = e.to_string();
                let message = if message.trim().is_empty() {
                    SAVE_FAILURE_FALLBACK.to_string()
                } else {
                    message
                };
                tracing::warn!(error = %message, "save failed");
                (SubmissionState::Failed(message), SubmitOutcome::Failed)
            }
        };
        *self.lock() = next;
        drop(guard);
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the submitter to idle if a save future is dropped before it settles
struct InFlightGuard<'a> {
    state: &'a Mutex<SubmissionState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_in_flight() {
            *state = SubmissionState::Idle;
        }
    }
}
