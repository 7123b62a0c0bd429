//! Multi-step report wizard state

use super::catalog::brsr_sections;
use super::forms::{SectionForm, SectionPhase, SectionSpec, SubmitOutcome, Submitter};
use super::{ReportData, SavePayload};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

/// Report-level facts shown in the header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportMeta {
    pub id: String,
    pub title: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// All section forms of one report plus navigation and report-level errors
#[derive(Debug)]
pub struct WizardState {
    sections: Vec<SectionForm>,
    current_step: usize,
    report: Option<ReportMeta>,
    submitted: bool,
    errors: VecDeque<String>,
    report_submitter: Submitter,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(brsr_sections())
    }
}

impl WizardState {
    pub fn new(specs: Vec<Arc<SectionSpec>>) -> Self {
        Self {
            sections: specs.into_iter().map(SectionForm::new).collect(),
            current_step: 0,
            report: None,
            submitted: false,
            errors: VecDeque::new(),
            report_submitter: Submitter::with_success_message("Report submitted"),
        }
    }

    pub fn sections(&self) -> &[SectionForm] {
        &self.sections
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.sections.len()
    }

    pub fn current_section(&self) -> Option<&SectionForm> {
        self.sections.get(self.current_step)
    }

    pub fn current_section_mut(&mut self) -> Option<&mut SectionForm> {
        self.sections.get_mut(self.current_step)
    }

    pub fn next_step(&mut self) {
        if self.current_step + 1 < self.sections.len() {
            self.current_step += 1;
        }
    }

    pub fn prev_step(&mut self) {
        self.current_step = self.current_step.saturating_sub(1);
    }

    pub fn go_to_step(&mut self, step: usize) {
        if step < self.sections.len() {
            self.current_step = step;
        }
    }

    pub fn report(&self) -> Option<&ReportMeta> {
        self.report.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.report.is_none()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn report_status_message(&self) -> Option<String> {
        self.report_submitter.state().message().map(str::to_string)
    }

    /// Hand freshly fetched report data to every section
    pub fn load_report(&mut self, report: Option<ReportData>) {
        let Some(report) = report else {
            tracing::info!("report not available yet");
            return;
        };
        tracing::info!(report_id = %report.id, submitted = report.is_submitted, "report loaded");
        for section in &mut self.sections {
            section.load_report(Some(&report));
        }
        let submitted_at = report.submitted_at;
        self.report = Some(ReportMeta {
            id: report.id.clone(),
            title: report.display_title(),
            submitted_at,
        });
        if report.is_submitted {
            self.mark_submitted(submitted_at.unwrap_or_else(Utc::now));
        }
    }

    /// Freeze every section once the report is submitted
    pub fn mark_submitted(&mut self, at: DateTime<Utc>) {
        self.submitted = true;
        for section in &mut self.sections {
            section.set_submitted(true);
        }
        if let Some(report) = &mut self.report {
            report.submitted_at.get_or_insert(at);
        }
    }

    // Report-level error queue

    pub fn push_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, "wizard error");
        self.errors.push_back(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn current_error(&self) -> Option<&str> {
        self.errors.front().map(String::as_str)
    }

    pub fn dismiss_error(&mut self) {
        self.errors.pop_front();
    }

    /// Save the section on screen through `save_progress`
    pub async fn save_current<F, Fut>(&mut self, save_progress: F) -> SubmitOutcome
    where
        F: FnOnce(SavePayload) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let Self {
            sections,
            current_step,
            errors,
            ..
        } = self;
        let Some(section) = sections.get_mut(*current_step) else {
            return SubmitOutcome::Rejected;
        };
        let title = section.spec().title.clone();
        section
            .save(save_progress, |message| {
                tracing::warn!(section = %title, error = %message, "section save failed");
                errors.push_back(format!("Could not save {title}: {message}"));
            })
            .await
    }

    /// Validate every section and submit the combined data through `submit`.
    ///
    /// On validation failure the wizard moves to the first section with errors.
    pub async fn submit_report<F, Fut>(&mut self, submit: F) -> SubmitOutcome
    where
        F: FnOnce(SavePayload) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        if self.submitted {
            return SubmitOutcome::Rejected;
        }
        if self
            .sections
            .iter()
            .any(|s| s.phase() == SectionPhase::Loading)
        {
            self.push_error("The report has not finished loading");
            return SubmitOutcome::Rejected;
        }

        let mut first_invalid = None;
        for (step, section) in self.sections.iter_mut().enumerate() {
            if !section.validate() && first_invalid.is_none() {
                first_invalid = Some(step);
            }
        }
        if let Some(step) = first_invalid {
            self.current_step = step;
            let title = self.sections[step].spec().title.clone();
            self.push_error(format!("Fix the highlighted fields in {title} before submitting"));
            return SubmitOutcome::Invalid;
        }

        let mut payload = SavePayload::new();
        for section in &self.sections {
            if let Some(snapshot) = section.snapshot() {
                payload.extend(section.spec().payload(snapshot));
            }
        }

        let outcome = self
            .report_submitter
            .handle_submit(move || submit(payload))
            .await;
        match outcome {
            SubmitOutcome::Saved => self.mark_submitted(Utc::now()),
            SubmitOutcome::Failed => {
                if let Some(message) = self.report_status_message() {
                    self.push_error(format!("Could not submit the report: {message}"));
                }
            }
            _ => {}
        }
        outcome
    }
}
