//! Application state and core logic

use crate::api::ReportApi;
use crate::state::{FieldKind, FormError, ReportData, SectionForm, SubmitOutcome, WizardState};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Window in which a second Ctrl+C or Ctrl+R goes ahead despite unsaved edits
const CONFIRM_WINDOW: Duration = Duration::from_secs(2);

/// Main application struct
pub struct App {
    /// Sections, navigation and report-level errors
    pub wizard: WizardState,
    /// Report API used for loading, saving and submitting
    api: Arc<dyn ReportApi>,
    /// Report the wizard edits
    report_id: String,
    /// Whether the app should quit
    quit: bool,
    /// Transient feedback shown in the status bar until the next key press
    pub status_message: Option<String>,
    /// Timestamp of last Ctrl+C press for double-tap quit
    pub last_ctrl_c: Option<Instant>,
    /// Timestamp of last Ctrl+R press for double-tap reload
    pub last_ctrl_r: Option<Instant>,
}

impl App {
    /// Create the app and fetch the report
    pub async fn new(api: Arc<dyn ReportApi>, report_id: impl Into<String>) -> Result<Self> {
        let mut app = Self::with_wizard(api, report_id, WizardState::default());
        app.reload().await;
        Ok(app)
    }

    /// Create the app around an existing wizard without fetching anything
    pub fn with_wizard(
        api: Arc<dyn ReportApi>,
        report_id: impl Into<String>,
        wizard: WizardState,
    ) -> Self {
        Self {
            wizard,
            api,
            report_id: report_id.into(),
            quit: false,
            status_message: None,
            last_ctrl_c: None,
            last_ctrl_r: None,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Fetch the report and hand it to every section.
    ///
    /// A report that does not exist yet starts out empty; the first save
    /// creates it.
    pub async fn reload(&mut self) {
        match self.api.fetch_report().await {
            Ok(Some(report)) => {
                self.wizard.load_report(Some(report));
                self.status_message = Some("Report loaded".to_string());
            }
            Ok(None) => {
                tracing::info!(report_id = %self.report_id, "starting a new report");
                self.wizard.load_report(Some(ReportData {
                    id: self.report_id.clone(),
                    ..Default::default()
                }));
                self.status_message = Some("Starting a new report".to_string());
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch report");
                self.wizard
                    .push_error(format!("Could not load the report: {e}"));
            }
        }
    }

    /// Save the section on screen
    pub async fn save_current(&mut self) {
        let api = Arc::clone(&self.api);
        let outcome = self
            .wizard
            .save_current(|payload| async move { api.save_progress(payload).await })
            .await;
        self.status_message = match outcome {
            SubmitOutcome::Invalid => Some("Fix the highlighted fields before saving".to_string()),
            SubmitOutcome::AlreadyInFlight => Some("A save is already in progress".to_string()),
            SubmitOutcome::Rejected => Some(self.not_editable_message().to_string()),
            // The section's own save state covers success and failure
            SubmitOutcome::Saved | SubmitOutcome::Failed => None,
        };
    }

    /// Validate every section and submit the report
    pub async fn submit_report(&mut self) {
        let api = Arc::clone(&self.api);
        let outcome = self
            .wizard
            .submit_report(|payload| async move { api.submit_report(payload).await })
            .await;
        self.status_message = match outcome {
            SubmitOutcome::Saved => Some("Report submitted".to_string()),
            SubmitOutcome::AlreadyInFlight => {
                Some("The report is already being submitted".to_string())
            }
            SubmitOutcome::Rejected if self.wizard.is_submitted() => {
                Some("The report has already been submitted".to_string())
            }
            // Errors are queued on the wizard
            _ => None,
        };
    }

    fn not_editable_message(&self) -> &'static str {
        if self.wizard.is_submitted() {
            "The report has been submitted and can no longer be edited"
        } else {
            "The report is still loading"
        }
    }

    fn has_unsaved_changes(&self) -> bool {
        self.wizard
            .sections()
            .iter()
            .any(|section| section.has_unsaved_changes())
    }

    /// Whether an action that drops local edits may go ahead now.
    /// With unsaved edits the first press only arms `last_press`.
    fn confirm_discard(&self, last_press: Option<Instant>) -> bool {
        let confirmed = last_press.is_some_and(|t| t.elapsed() < CONFIRM_WINDOW);
        confirmed || !self.has_unsaved_changes()
    }

    /// Quit, asking for a second press when there are unsaved edits
    fn handle_ctrl_c(&mut self) {
        if self.confirm_discard(self.last_ctrl_c) {
            self.quit = true;
            return;
        }
        self.last_ctrl_c = Some(Instant::now());
        self.status_message =
            Some("Unsaved changes. Press Ctrl+C again to quit without saving".to_string());
    }

    /// Reload, asking for a second press when there are unsaved edits
    async fn handle_ctrl_r(&mut self) {
        if self.confirm_discard(self.last_ctrl_r) {
            self.last_ctrl_r = None;
            self.reload().await;
            return;
        }
        self.last_ctrl_r = Some(Instant::now());
        self.status_message =
            Some("Unsaved changes. Press Ctrl+R again to reload and discard them".to_string());
    }

    /// Handle a key event
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle error dialog dismissal first (modal)
        if self.wizard.has_errors() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.wizard.dismiss_error();
            }
            return Ok(());
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.handle_ctrl_c();
            return Ok(());
        }

        // Clear any status messages on key press
        self.status_message = None;

        match key.code {
            KeyCode::Char('s') if ctrl => self.save_current().await,
            KeyCode::Char('r') if ctrl => self.handle_ctrl_r().await,
            KeyCode::Char('z') if ctrl => {
                if let Some(section) = self.wizard.current_section_mut() {
                    let result = section.reset();
                    self.report_edit(result.map(|_| true));
                }
            }
            KeyCode::F(10) => self.submit_report().await,
            KeyCode::PageDown => self.wizard.next_step(),
            KeyCode::PageUp => self.wizard.prev_step(),
            KeyCode::Tab | KeyCode::Down => {
                if let Some(section) = self.wizard.current_section_mut() {
                    section.next_field();
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if let Some(section) = self.wizard.current_section_mut() {
                    section.prev_field();
                }
            }
            KeyCode::Char(' ') => self.space(),
            KeyCode::Char(c) if !ctrl => self.edit(|section| section.input_char(c)),
            KeyCode::Backspace => self.edit(|section| section.backspace()),
            KeyCode::Enter => self.newline(),
            _ => {}
        }
        Ok(())
    }

    fn edit(&mut self, edit: impl FnOnce(&mut SectionForm) -> Result<bool, FormError>) {
        if let Some(section) = self.wizard.current_section_mut() {
            let result = edit(section);
            self.report_edit(result);
        }
    }

    /// Space toggles yes/no fields and is typed into everything else
    fn space(&mut self) {
        let is_flag = self
            .wizard
            .current_section()
            .and_then(|s| s.active_descriptor())
            .is_some_and(|field| field.kind == FieldKind::Flag);
        if is_flag {
            self.edit(|section| section.toggle_flag());
        } else {
            self.edit(|section| section.input_char(' '));
        }
    }

    /// Enter breaks lines in multi-line fields and moves on from the rest
    fn newline(&mut self) {
        let Some(section) = self.wizard.current_section_mut() else {
            return;
        };
        if section.active_descriptor().is_some_and(|f| f.is_multiline()) {
            let result = section.input_char('\n');
            self.report_edit(result);
        } else {
            section.next_field();
        }
    }

    fn report_edit(&mut self, result: Result<bool, FormError>) {
        match result {
            Ok(_) => {}
            Err(FormError::ReadOnly | FormError::NotLoaded) => {
                self.status_message = Some(self.not_editable_message().to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "edit rejected");
                self.status_message = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockReportApi;
    use crate::state::{
        FieldCheck, FieldDescriptor, FieldValue, PersistedField, SavePayload, SectionSpec,
        SubmissionState,
    };
    use std::sync::Mutex;

    fn specs() -> Vec<Arc<SectionSpec>> {
        vec![
            Arc::new(SectionSpec {
                key: "a".to_string(),
                title: "Section A".to_string(),
                persisted: vec![PersistedField::new("sa_general", "general")],
                fields: vec![
                    FieldDescriptor::text("general.name", "Name"),
                    FieldDescriptor::number("general.headcount", "Headcount"),
                    FieldDescriptor::flag("general.listed", "Listed"),
                    FieldDescriptor::multiline("general.notes", "Notes"),
                ],
                checks: vec![FieldCheck::required("general.name")],
            }),
            Arc::new(SectionSpec {
                key: "b".to_string(),
                title: "Section B".to_string(),
                persisted: vec![PersistedField::new("sb_policy", "policy")],
                fields: vec![FieldDescriptor::text("policy.link", "Link")],
                checks: vec![],
            }),
        ]
    }

    fn report(submitted: bool) -> ReportData {
        serde_json::from_value(serde_json::json!({
            "id": "r1",
            "company_name": "Acme Ltd",
            "is_submitted": submitted,
            "sa_general": {"name": "Acme"}
        }))
        .unwrap()
    }

    fn loaded_app(api: MockReportApi) -> App {
        let mut wizard = WizardState::new(specs());
        wizard.load_report(Some(report(false)));
        App::with_wizard(Arc::new(api), "r1", wizard)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    fn value(app: &App, path: &str) -> Option<FieldValue> {
        app.wizard.current_section().unwrap().value(path).cloned()
    }

    mod loading {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_new_fetches_report() {
            let mut api = MockReportApi::new();
            api.expect_fetch_report()
                .times(1)
                .returning(|| Ok(Some(report(false))));

            let app = App::new(Arc::new(api), "r1").await.unwrap();
            assert!(!app.wizard.is_loading());
            assert_eq!(app.wizard.report().unwrap().title, "Acme Ltd");
            assert_eq!(app.status_message.as_deref(), Some("Report loaded"));
        }

        #[tokio::test]
        async fn test_missing_report_starts_empty() {
            let mut api = MockReportApi::new();
            api.expect_fetch_report().returning(|| Ok(None));

            let app = App::new(Arc::new(api), "new-report").await.unwrap();
            assert!(!app.wizard.is_loading());
            assert_eq!(app.wizard.report().unwrap().id, "new-report");
            assert_eq!(app.status_message.as_deref(), Some("Starting a new report"));
        }

        #[tokio::test]
        async fn test_fetch_failure_queues_error() {
            let mut api = MockReportApi::new();
            api.expect_fetch_report()
                .returning(|| Err(anyhow::anyhow!("connection refused")));

            let app = App::new(Arc::new(api), "r1").await.unwrap();
            assert!(app.wizard.is_loading());
            assert_eq!(
                app.wizard.current_error(),
                Some("Could not load the report: connection refused")
            );
        }

        #[tokio::test]
        async fn test_ctrl_r_reloads() {
            let mut api = MockReportApi::new();
            api.expect_fetch_report()
                .times(1)
                .returning(|| Ok(Some(report(true))));
            let mut app = loaded_app(api);

            app.handle_key(ctrl('r')).await.unwrap();
            assert!(app.wizard.is_submitted());
        }

        #[tokio::test]
        async fn test_ctrl_r_with_unsaved_edits_needs_second_press() {
            let mut api = MockReportApi::new();
            api.expect_fetch_report()
                .times(1)
                .returning(|| Ok(Some(report(false))));
            let mut app = loaded_app(api);
            type_text(&mut app, "!").await;

            app.handle_key(ctrl('r')).await.unwrap();
            assert_eq!(value(&app, "general.name"), Some(FieldValue::from("Acme!")));
            assert_eq!(
                app.status_message.as_deref(),
                Some("Unsaved changes. Press Ctrl+R again to reload and discard them")
            );

            app.handle_key(ctrl('r')).await.unwrap();
            assert_eq!(value(&app, "general.name"), Some(FieldValue::from("Acme")));
            assert!(app.last_ctrl_r.is_none());
        }

        #[tokio::test]
        async fn test_stale_ctrl_r_does_not_confirm() {
            let mut api = MockReportApi::new();
            api.expect_fetch_report().never();
            let mut app = loaded_app(api);
            type_text(&mut app, "!").await;
            app.last_ctrl_r = Some(Instant::now() - Duration::from_secs(5));

            app.handle_key(ctrl('r')).await.unwrap();
            assert_eq!(value(&app, "general.name"), Some(FieldValue::from("Acme!")));
        }

        #[tokio::test]
        async fn test_edits_while_loading_are_refused() {
            let api = MockReportApi::new();
            let mut app = App::with_wizard(Arc::new(api), "r1", WizardState::new(specs()));
            type_text(&mut app, "x").await;
            assert_eq!(
                app.status_message.as_deref(),
                Some("The report is still loading")
            );
        }
    }

    mod editing {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_typing_edits_active_field() {
            let mut app = loaded_app(MockReportApi::new());
            type_text(&mut app, " Ltd").await;
            assert_eq!(
                value(&app, "general.name"),
                Some(FieldValue::Text("Acme Ltd".to_string()))
            );
            app.handle_key(key(KeyCode::Backspace)).await.unwrap();
            assert_eq!(
                value(&app, "general.name"),
                Some(FieldValue::Text("Acme Lt".to_string()))
            );
        }

        #[tokio::test]
        async fn test_number_field_ignores_letters() {
            let mut app = loaded_app(MockReportApi::new());
            app.handle_key(key(KeyCode::Tab)).await.unwrap();
            type_text(&mut app, "4a2").await;
            assert_eq!(value(&app, "general.headcount"), Some(FieldValue::Number(42.0)));
        }

        #[tokio::test]
        async fn test_space_toggles_flag() {
            let mut app = loaded_app(MockReportApi::new());
            app.handle_key(key(KeyCode::Tab)).await.unwrap();
            app.handle_key(key(KeyCode::Tab)).await.unwrap();
            app.handle_key(key(KeyCode::Char(' '))).await.unwrap();
            assert_eq!(value(&app, "general.listed"), Some(FieldValue::Flag(true)));
        }

        #[tokio::test]
        async fn test_enter_breaks_lines_only_in_multiline_fields() {
            let mut app = loaded_app(MockReportApi::new());
            app.handle_key(key(KeyCode::Enter)).await.unwrap();
            assert_eq!(app.wizard.current_section().unwrap().active_field(), 1);

            app.handle_key(key(KeyCode::BackTab)).await.unwrap();
            app.handle_key(key(KeyCode::Up)).await.unwrap();
            assert_eq!(app.wizard.current_section().unwrap().active_field(), 3);
            type_text(&mut app, "a").await;
            app.handle_key(key(KeyCode::Enter)).await.unwrap();
            type_text(&mut app, "b").await;
            assert_eq!(
                value(&app, "general.notes"),
                Some(FieldValue::Text("a\nb".to_string()))
            );
        }

        #[tokio::test]
        async fn test_ctrl_z_discards_section_edits() {
            let mut app = loaded_app(MockReportApi::new());
            type_text(&mut app, "!!").await;
            app.handle_key(ctrl('z')).await.unwrap();
            assert_eq!(
                value(&app, "general.name"),
                Some(FieldValue::Text("Acme".to_string()))
            );
        }

        #[tokio::test]
        async fn test_page_keys_change_step() {
            let mut app = loaded_app(MockReportApi::new());
            app.handle_key(key(KeyCode::PageDown)).await.unwrap();
            assert_eq!(app.wizard.current_step(), 1);
            app.handle_key(key(KeyCode::PageDown)).await.unwrap();
            assert_eq!(app.wizard.current_step(), 1);
            app.handle_key(key(KeyCode::PageUp)).await.unwrap();
            assert_eq!(app.wizard.current_step(), 0);
        }

        #[tokio::test]
        async fn test_submitted_report_is_read_only() {
            let mut wizard = WizardState::new(specs());
            wizard.load_report(Some(report(true)));
            let mut app = App::with_wizard(Arc::new(MockReportApi::new()), "r1", wizard);

            type_text(&mut app, "x").await;
            assert_eq!(
                value(&app, "general.name"),
                Some(FieldValue::Text("Acme".to_string()))
            );
            assert_eq!(
                app.status_message.as_deref(),
                Some("The report has been submitted and can no longer be edited")
            );
        }
    }

    mod saving {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_ctrl_s_saves_section_payload() {
            let received: Arc<Mutex<Option<SavePayload>>> = Arc::default();
            let sink = Arc::clone(&received);
            let mut api = MockReportApi::new();
            api.expect_save_progress().times(1).returning(move |payload| {
                *sink.lock().unwrap() = Some(payload);
                Ok(())
            });
            let mut app = loaded_app(api);

            type_text(&mut app, "!").await;
            app.handle_key(ctrl('s')).await.unwrap();

            let payload = received.lock().unwrap().take().unwrap();
            let general = payload["sa_general"].as_group().unwrap();
            assert_eq!(general["name"], FieldValue::Text("Acme!".to_string()));
            assert!(app.wizard.current_section().unwrap().last_saved_at().is_some());
        }

        #[tokio::test]
        async fn test_invalid_section_is_not_sent() {
            let mut api = MockReportApi::new();
            api.expect_save_progress().never();
            let mut app = loaded_app(api);

            for _ in 0.."Acme".len() {
                app.handle_key(key(KeyCode::Backspace)).await.unwrap();
            }
            app.handle_key(ctrl('s')).await.unwrap();

            let section = app.wizard.current_section().unwrap();
            assert_eq!(
                section.errors().error_for("general.name"),
                Some("This field is required")
            );
            assert_eq!(
                app.status_message.as_deref(),
                Some("Fix the highlighted fields before saving")
            );
        }

        #[tokio::test]
        async fn test_failed_save_opens_error_dialog() {
            let mut api = MockReportApi::new();
            api.expect_save_progress()
                .returning(|_| Err(anyhow::anyhow!("Database unavailable")));
            let mut app = loaded_app(api);

            app.handle_key(ctrl('s')).await.unwrap();
            assert_eq!(
                app.wizard.current_error(),
                Some("Could not save Section A: Database unavailable")
            );
            assert_eq!(
                app.wizard.current_section().unwrap().submission_state(),
                SubmissionState::Failed("Database unavailable".to_string())
            );

            // Dialog swallows other keys until dismissed
            app.handle_key(key(KeyCode::PageDown)).await.unwrap();
            assert_eq!(app.wizard.current_step(), 0);
            app.handle_key(key(KeyCode::Esc)).await.unwrap();
            assert!(!app.wizard.has_errors());
        }

        #[tokio::test]
        async fn test_ctrl_z_after_save_keeps_saved_edits() {
            let mut api = MockReportApi::new();
            api.expect_save_progress().times(1).returning(|_| Ok(()));
            let mut app = loaded_app(api);

            type_text(&mut app, "!").await;
            app.handle_key(ctrl('s')).await.unwrap();
            type_text(&mut app, "?").await;
            app.handle_key(ctrl('z')).await.unwrap();

            assert_eq!(value(&app, "general.name"), Some(FieldValue::from("Acme!")));
            assert!(!app.wizard.current_section().unwrap().has_unsaved_changes());
            app.handle_key(ctrl('c')).await.unwrap();
            assert!(app.should_quit());
        }
    }

    mod submitting {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_f10_submits_and_freezes() {
            let mut api = MockReportApi::new();
            api.expect_submit_report().times(1).returning(|payload| {
                assert!(payload.contains_key("sa_general"));
                assert!(payload.contains_key("sb_policy"));
                Ok(())
            });
            let mut app = loaded_app(api);

            app.handle_key(key(KeyCode::F(10))).await.unwrap();
            assert!(app.wizard.is_submitted());
            assert_eq!(app.status_message.as_deref(), Some("Report submitted"));

            app.handle_key(key(KeyCode::F(10))).await.unwrap();
            assert_eq!(
                app.status_message.as_deref(),
                Some("The report has already been submitted")
            );
        }

        #[tokio::test]
        async fn test_failed_submit_stays_editable() {
            let mut api = MockReportApi::new();
            api.expect_submit_report()
                .returning(|_| Err(anyhow::anyhow!("Report is locked")));
            let mut app = loaded_app(api);

            app.handle_key(key(KeyCode::F(10))).await.unwrap();
            assert!(!app.wizard.is_submitted());
            assert_eq!(
                app.wizard.current_error(),
                Some("Could not submit the report: Report is locked")
            );
        }
    }

    mod quitting {
        use super::*;

        #[tokio::test]
        async fn test_ctrl_c_quits_when_clean() {
            let mut app = loaded_app(MockReportApi::new());
            app.handle_key(ctrl('c')).await.unwrap();
            assert!(app.should_quit());
        }

        #[tokio::test]
        async fn test_ctrl_c_twice_with_unsaved_edits() {
            let mut app = loaded_app(MockReportApi::new());
            type_text(&mut app, "!").await;

            app.handle_key(ctrl('c')).await.unwrap();
            assert!(!app.should_quit());
            assert!(app.last_ctrl_c.is_some());

            app.handle_key(ctrl('c')).await.unwrap();
            assert!(app.should_quit());
        }

        #[tokio::test]
        async fn test_stale_ctrl_c_does_not_confirm() {
            let mut app = loaded_app(MockReportApi::new());
            type_text(&mut app, "!").await;
            app.last_ctrl_c = Some(Instant::now() - Duration::from_secs(5));

            app.handle_key(ctrl('c')).await.unwrap();
            assert!(!app.should_quit());
        }
    }
}
