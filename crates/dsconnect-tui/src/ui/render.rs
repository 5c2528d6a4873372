use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use dsconnect_core::Callout;

use crate::app::{Action, App, AppState, Field};

use super::styles;

/// Width of the text inside a form field
const FIELD_WIDTH: usize = 40;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if let Some(action) = app.pending {
        render_pending_overlay(frame, action);
    }

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  dsconnect - openBIS connection";
    let help_hint = "[F1] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    // Connection
    lines.push(section_line("Connection"));
    for field in [Field::Url, Field::Token, Field::Username, Field::Password] {
        lines.push(field_line(app, field));
    }
    lines.push(button_line(app, Field::Connect));
    lines.push(Line::from(""));
    lines.extend(callout_lines(&app.connection_view));
    lines.push(Line::from(""));

    // Usage
    lines.push(section_line("Usage"));
    lines.push(Line::from(vec![
        Span::styled("  Ctrl+E ", styles::help_key_style()),
        Span::styled("experimental steps in your home space   ", styles::help_desc_style()),
        Span::styled("Ctrl+S ", styles::help_key_style()),
        Span::styled("all spaces", styles::help_desc_style()),
    ]));
    if let Some(view) = &app.query_view {
        lines.extend(callout_lines(view));
    }
    lines.push(Line::from(""));

    // Create PAT
    lines.push(section_line("Create PAT"));
    lines.extend(callout_lines(&app.gate.view()));
    if app.gate.shows_form() {
        for field in [Field::Label, Field::ValidFrom, Field::ValidTo] {
            lines.push(field_line(app, field));
        }
        lines.push(button_line(app, Field::CreatePat));
    }
    if let Some(view) = &app.issuance_view {
        lines.push(Line::from(""));
        lines.extend(callout_lines(view));
    }

    let (rows, scroll) = layout_rows(lines, area.width, area.height);
    let paragraph = Paragraph::new(rows).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Wrap `lines` to screen rows of `width` and pick the scroll offset that
/// keeps the focused row visible in a viewport of `height` rows.
fn layout_rows(lines: Vec<Line<'static>>, width: u16, height: u16) -> (Vec<Line<'static>>, u16) {
    let rows: Vec<Line<'static>> = lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width as usize))
        .collect();
    let focus_row = rows
        .iter()
        .position(|l| l.spans.iter().any(|s| s.style == styles::selected_style()))
        .unwrap_or(0);
    let scroll = (focus_row as u16).saturating_sub(height.saturating_sub(3));
    (rows, scroll)
}

/// Break a styled line into rows of at most `width` characters
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 || line.width() <= width {
        return vec![line];
    }
    let mut rows = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut used = 0;
    for span in line.spans {
        let style = span.style;
        let mut chunk = String::new();
        for c in span.content.chars() {
            if used == width {
                if !chunk.is_empty() {
                    row.push(Span::styled(std::mem::take(&mut chunk), style));
                }
                rows.push(Line::from(std::mem::take(&mut row)));
                used = 0;
            }
            chunk.push(c);
            used += 1;
        }
        if !chunk.is_empty() {
            row.push(Span::styled(chunk, style));
        }
    }
    if !row.is_empty() {
        rows.push(Line::from(row));
    }
    rows
}

fn section_line(title: &str) -> Line<'static> {
    Line::from(Span::styled(format!(" {}", title), styles::section_style()))
}

fn field_line(app: &App, field: Field) -> Line<'static> {
    let focused = app.focus == field;
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let value = app.field_value(field);
    let shown: String = if field.is_secret() {
        "*".repeat(value.chars().count().min(FIELD_WIDTH))
    } else {
        // Show the tail of long values so the cursor stays visible
        let skip = value.chars().count().saturating_sub(FIELD_WIDTH);
        value.chars().skip(skip).collect()
    };
    let cursor = if focused { "▌" } else { " " };

    Line::from(vec![
        Span::styled(format!("   {:>13}: [", field.label()), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(app: &App, field: Field) -> Line<'static> {
    let label = field.label();
    let (text, style) = if app.focus == field {
        (format!(" ▶ {} ◀ ", label), styles::selected_style())
    } else {
        (format!("   {}   ", label), styles::list_item_style())
    };
    Line::from(vec![
        Span::raw("                  ["),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}

fn callout_lines(callout: &Callout) -> Vec<Line<'static>> {
    let style = styles::callout_style(callout.kind);
    let mut lines = vec![Line::from(Span::styled(format!("   {}", callout.title), style))];
    for line in &callout.lines {
        lines.push(Line::from(vec![
            Span::styled("     * ", style),
            Span::styled(line.clone(), styles::list_item_style()),
        ]));
    }
    lines
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[Tab] next | [Enter] press | [Esc] quit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(conn) = &app.connection {
        format!(" {} @ {} ", conn.user_id(), conn.session.hostname())
    } else {
        " Not connected ".to_string()
    };
    let left_style = if app.status_message.is_some() {
        styles::success_style()
    } else {
        styles::muted_style()
    };

    let right_text = format!(" {} ", shortcuts);
    let width = area.width as usize;
    let padding_len = width.saturating_sub(left_text.len()).saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_pending_overlay(frame: &mut Frame, action: Action) {
    let message = action.pending_message();
    let area = centered_rect_fixed(message.len() as u16 + 6, 3, frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!("  {}", message),
        styles::highlight_style(),
    )))
    .block(block);

    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 20, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  dsconnect", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        Line::from(vec![
            Span::styled("  Tab/↓     ", styles::help_key_style()),
            Span::styled("Next field", styles::help_desc_style()),
        ]),
        Line::from(vec![
            Span::styled("  S-Tab/↑   ", styles::help_key_style()),
            Span::styled("Previous field", styles::help_desc_style()),
        ]),
        Line::from(vec![
            Span::styled("  Enter     ", styles::help_key_style()),
            Span::styled("Press button / next field", styles::help_desc_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        Line::from(vec![
            Span::styled("  Ctrl+E    ", styles::help_key_style()),
            Span::styled("List experimental steps in home space", styles::help_desc_style()),
        ]),
        Line::from(vec![
            Span::styled("  Ctrl+S    ", styles::help_key_style()),
            Span::styled("List spaces", styles::help_desc_style()),
        ]),
        Line::from(vec![
            Span::styled("  Esc       ", styles::help_key_style()),
            Span::styled("Quit", styles::help_desc_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  A non-empty PAT is used instead of the password.",
            styles::muted_style(),
        )),
        Line::from(Span::styled(
            "  New PATs can only be created from a password login.",
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("F1", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(46, 10, outer), Rect::new(27, 15, 46, 10));
        // Clamped to a small terminal
        let small = Rect::new(0, 0, 30, 5);
        assert_eq!(centered_rect_fixed(46, 10, small), Rect::new(0, 0, 30, 5));
    }

    #[test]
    fn test_wrap_line_splits_across_spans() {
        let line = Line::from(vec![
            Span::raw("abcd"),
            Span::styled("efghij", styles::error_style()),
        ]);
        let rows = wrap_line(line, 4);
        let text: Vec<String> = rows
            .iter()
            .map(|r| r.spans.iter().map(|s| s.content.to_string()).collect())
            .collect();
        assert_eq!(text, vec!["abcd", "efgh", "ij"]);
        assert_eq!(rows[1].spans[0].style, styles::error_style());
    }

    #[test]
    fn test_focused_row_stays_visible_with_long_callouts() {
        // Long callout lines before the focused field wrap into many rows
        let mut lines: Vec<Line<'static>> = (0..3)
            .map(|_| Line::from("x".repeat(100)))
            .collect();
        lines.push(Line::from(Span::styled("focused", styles::selected_style())));

        let (rows, scroll) = layout_rows(lines, 20, 10);
        assert_eq!(rows.len(), 16);
        let focus_row = 15u16;
        assert!(focus_row >= scroll && focus_row < scroll + 10);
    }

    #[test]
    fn test_callout_lines() {
        let callout = Callout::danger("Connection failed").line("Unauthorized");
        let lines = callout_lines(&callout);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "   Connection failed");
        assert_eq!(lines[1].spans[1].content, "Unauthorized");
    }
}
