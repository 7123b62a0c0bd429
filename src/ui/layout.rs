//! Layout components (step sidebar, status bar)

use crate::app::App;
use crate::state::{SectionForm, SectionPhase, SubmissionState};
use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 30;

/// Split the screen into sidebar, main content and status bar
pub fn create_layout(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(SIDEBAR_WIDTH), // Steps
            Constraint::Min(0),                // Section form
        ])
        .split(rows[0]);

    (columns[0], columns[1], rows[1])
}

/// One-character marker for a step in the sidebar
fn step_marker(section: &SectionForm) -> (&'static str, Color) {
    match section.phase() {
        SectionPhase::Loading => ("…", Color::DarkGray),
        SectionPhase::ReadOnly => ("✓", Color::Green),
        SectionPhase::Editable if section.errors().has_errors() => ("!", Color::Red),
        SectionPhase::Editable if section.submission_state().is_failure() => ("!", Color::Red),
        SectionPhase::Editable if section.has_unsaved_changes() => ("*", Color::Yellow),
        SectionPhase::Editable if section.last_saved_at().is_some() => ("•", Color::Green),
        SectionPhase::Editable => (" ", Color::Gray),
    }
}

/// Draw the list of wizard steps, keeping the current one visible
pub fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let title = app
        .wizard
        .report()
        .map(|r| r.title.clone())
        .unwrap_or_else(|| "BRSR".to_string());

    let current = app.wizard.current_step();
    let items: Vec<ListItem> = app
        .wizard
        .sections()
        .iter()
        .enumerate()
        .map(|(idx, section)| {
            let (marker, color) = step_marker(section);
            let label_style = if idx == current {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{marker} "), Style::default().fg(color)),
                Span::styled(format!("{}. ", idx + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(section.spec().title.clone(), label_style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" {title} "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .highlight_symbol("▸");

    let mut list_state = ListState::default().with_selected(Some(current));
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Keyboard hints for the section on screen; read-only sections offer no save
fn hints(section: Option<&SectionForm>) -> &'static str {
    match section.map(SectionForm::phase) {
        Some(SectionPhase::Editable) => {
            "Tab:next  Space:toggle  ^S:save  ^Z:undo  PgUp/PgDn:step  F10:submit"
        }
        Some(SectionPhase::ReadOnly) => "Tab:next  PgUp/PgDn:step  ^R:reload",
        Some(SectionPhase::Loading) | None => "^R:reload",
    }
}

/// Save state of the section on screen
fn save_status(section: &SectionForm) -> Option<Span<'static>> {
    match section.submission_state() {
        SubmissionState::Idle => None,
        SubmissionState::InFlight => Some(Span::styled(
            "Saving...",
            Style::default().fg(Color::Yellow),
        )),
        SubmissionState::Succeeded(message) => {
            let text = match section.last_saved_at() {
                Some(at) => format!("{message} at {}", at.with_timezone(&Local).format("%H:%M")),
                None => message,
            };
            Some(Span::styled(text, Style::default().fg(Color::Green)))
        }
        SubmissionState::Failed(message) => {
            Some(Span::styled(message, Style::default().fg(Color::Red)))
        }
    }
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let section = app.wizard.current_section();
    let separator = || Span::raw(" | ");

    let mut spans = vec![Span::styled(
        format!(
            " Step {}/{} ",
            app.wizard.current_step() + 1,
            app.wizard.step_count()
        ),
        Style::default().fg(Color::White),
    )];
    spans.push(Span::styled(hints(section), Style::default().fg(Color::Gray)));

    if let Some(status) = section.and_then(save_status) {
        spans.push(separator());
        spans.push(status);
    }

    if let Some(msg) = &app.status_message {
        spans.push(separator());
        spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Cyan)));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);

    // Quit hint on the right
    let quit_hint = " ^C:quit ";
    let hint_width = quit_hint.len() as u16;
    if area.width > hint_width {
        let quit_area = Rect {
            x: area.x + area.width - hint_width,
            width: hint_width,
            ..area
        };
        let quit_widget =
            Paragraph::new(quit_hint).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
        frame.render_widget(quit_widget, quit_area);
    }
}
