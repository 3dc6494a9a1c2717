//! Common UI components shared across the dashboard.
//!
//! This module contains the header bar, status bar, help overlay and the
//! number formatting used by the panels.

use std::time::Duration;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::theme::Tone;
use crate::app::App;
use crate::data::{Field, NOT_AVAILABLE};
use crate::source::SourceId;

/// Tone of the node status: only `Active` is good.
pub fn status_tone(status: &str) -> Tone {
    if status == "Active" {
        Tone::Good
    } else {
        Tone::Bad
    }
}

/// Tone of the checkpoint lag: any lag is bad, unknown is bad too.
pub fn lag_tone(lag: Option<u64>) -> Tone {
    match lag {
        Some(0) => Tone::Good,
        _ => Tone::Bad,
    }
}

/// Format a count with thousands separators (e.g., 1234567 -> "1,234,567").
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a count for compact display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}G", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn format_age(age: Option<Duration>) -> String {
    match age {
        Some(age) => format!("{:.1}s ago", age.as_secs_f64()),
        None => "never".to_string(),
    }
}

/// Render the header bar with node identity and status.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.snapshot;
    let status = state.node_status();
    let status_style = if status == NOT_AVAILABLE {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        app.theme.tone_style(status_tone(&status))
    };

    let line = Line::from(vec![
        Span::styled(" ● ", status_style),
        Span::styled(
            "WALRUS STORAGE NODE ",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(status, status_style),
        Span::raw(" │ epoch "),
        Span::styled(
            state.epoch_display(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ chain "),
        Span::raw(state.display(Field::ChainIdentifier)),
        Span::raw(" │ "),
        Span::styled(app.endpoint(SourceId::Telemetry).to_string(), app.theme.muted),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows the age of each source's data, the last fetch error if any, and the
/// available controls. Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let mut spans = Vec::new();
    for source in SourceId::ALL {
        let status = app.snapshot.status(source);
        let marker = if app.is_fetching(source) { "⟳" } else { " " };
        spans.push(Span::raw(format!(
            " {}{} {} │",
            marker,
            source.label(),
            format_age(app.since_update(source))
        )));
        if let Some(err) = &status.last_error {
            spans.push(Span::styled(
                format!(" {} error: {} │", source.label(), err),
                Style::default().fg(app.theme.bad),
            ));
        }
    }
    spans.push(Span::raw(" r:refresh e:export ?:help q:quit"));

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from("  r         Refresh metrics and health now"),
        Line::from("  e         Export to JSON"),
        Line::from("  ?         Toggle this help"),
        Line::from("  q Esc     Quit"),
        Line::from("  Ctrl-C    Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Endpoints",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(format!("  {}", app.endpoint(SourceId::Telemetry))),
        Line::from(format!("  {}", app.endpoint(SourceId::Health))),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 56u16.min(area.width.saturating_sub(4));
    let help_height = 15u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
