//! Rendering of the section on screen

use crate::state::{FieldDescriptor, FieldKind, FieldValue, SectionForm, SectionPhase};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Text lines shown for a multi-line field
const MULTILINE_ROWS: u16 = 3;

const CURSOR: &str = "▌";

/// Draw the section's fields, keeping the active field in view
pub fn draw(frame: &mut Frame, area: Rect, section: &SectionForm) {
    let phase = section.phase();
    let border_color = if phase == SectionPhase::ReadOnly {
        Color::DarkGray
    } else {
        Color::Cyan
    };
    let block = Block::default()
        .title(format!(" {} ", section.spec().title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let mut inner = block.inner(area);
    frame.render_widget(block, area);

    if phase == SectionPhase::Loading {
        let loading = Paragraph::new("Loading report...").style(Style::default().fg(Color::Yellow));
        frame.render_widget(loading, inner);
        return;
    }

    if phase == SectionPhase::ReadOnly && inner.height > 0 {
        let banner = Paragraph::new(Line::from(vec![Span::styled(
            " Submitted (read-only) ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]));
        frame.render_widget(banner, Rect { height: 1, ..inner });
        inner.y += 1;
        inner.height -= 1;
    }

    let fields = &section.spec().fields;
    let heights: Vec<u16> = fields
        .iter()
        .map(|f| field_height(f, section.errors().error_for(&f.path).is_some()))
        .collect();
    let active = section.active_field();
    let first = first_visible(&heights, active, inner.height);

    let mut y = inner.y;
    for (idx, field) in fields.iter().enumerate().skip(first) {
        let height = heights[idx];
        if y + height > inner.y + inner.height {
            break;
        }
        let field_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height,
        };
        draw_field(
            frame,
            field_area,
            field,
            section.value(&field.path),
            section.errors().error_for(&field.path),
            idx == active && phase == SectionPhase::Editable,
            phase == SectionPhase::ReadOnly,
        );
        y += height;
    }
}

/// Rows a field takes: borders, content, and a line for its error
fn field_height(field: &FieldDescriptor, has_error: bool) -> u16 {
    let content = if field.is_multiline() { MULTILINE_ROWS } else { 1 };
    2 + content + u16::from(has_error)
}

/// Index of the first field to draw so that `active` fits in `available` rows
fn first_visible(heights: &[u16], active: usize, available: u16) -> usize {
    if heights.is_empty() {
        return 0;
    }
    let active = active.min(heights.len() - 1);
    let mut first = 0;
    while first < active && heights[first..=active].iter().sum::<u16>() > available {
        first += 1;
    }
    first
}

fn display_text(kind: FieldKind, value: Option<&FieldValue>) -> String {
    match (kind, value) {
        (FieldKind::Flag, value) => {
            if value.is_some_and(FieldValue::as_flag) {
                "[x] Yes".to_string()
            } else {
                "[ ] No".to_string()
            }
        }
        (_, Some(value)) => value.display_value(),
        (_, None) => String::new(),
    }
}

/// Draw one field: label in the border, value inside, error underneath
fn draw_field(
    frame: &mut Frame,
    area: Rect,
    field: &FieldDescriptor,
    value: Option<&FieldValue>,
    error: Option<&str>,
    is_active: bool,
    read_only: bool,
) {
    let value_style = if read_only {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    } else if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };
    let border_style = match (error, is_active) {
        (Some(_), _) => Style::default().fg(Color::Red),
        (None, true) => Style::default().fg(Color::Cyan),
        (None, false) => Style::default().fg(Color::DarkGray),
    };

    let text = display_text(field.kind, value);
    let text = if text.is_empty() && !is_active {
        "(empty)".to_string()
    } else {
        text
    };
    let cursor_style = Style::default().fg(Color::Cyan);

    let mut lines: Vec<Line> = if field.is_multiline() {
        text.split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), value_style)))
            .collect()
    } else {
        vec![Line::from(Span::styled(text, value_style))]
    };
    if is_active && field.kind != FieldKind::Flag {
        if let Some(last) = lines.last_mut() {
            last.spans.push(Span::styled(CURSOR, cursor_style));
        }
    }
    if field.is_multiline() {
        // Show the end of long text where the cursor is
        let overflow = lines.len().saturating_sub(MULTILINE_ROWS as usize);
        lines.drain(..overflow);
        lines.resize(MULTILINE_ROWS as usize, Line::from(""));
    }
    if let Some(error) = error {
        lines.push(Line::from(Span::styled(
            format!("⚠ {error}"),
            Style::default().fg(Color::Red),
        )));
    }

    let block = Block::default()
        .title(format!(" {} ", field.label))
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}
