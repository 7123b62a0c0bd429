//! UI module for rendering the TUI

mod components;
mod layout;
mod section_form;

use crate::app::App;
use components::render_error_dialog;
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let (sidebar_area, main_area, status_area) = layout::create_layout(frame.area());

    layout::draw_sidebar(frame, sidebar_area, app);
    if let Some(section) = app.wizard.current_section() {
        section_form::draw(frame, main_area, section);
    }
    layout::draw_status_bar(frame, status_area, app);

    // Error dialog overlays everything (modal)
    if let Some(error) = app.wizard.current_error() {
        render_error_dialog(frame, error, app.wizard.error_count());
    }
}
