//! The top row of the dashboard: node info, shards, headline numbers and the
//! application log.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use tui_big_text::{BigText, PixelSize};

use super::common::{format_thousands, lag_tone, status_tone};
use super::theme::{Theme, Tone};
use crate::app::App;
use crate::data::{Field, NOT_AVAILABLE};

fn panel<'a>(title: &'a str, tone: Tone, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.color(tone)))
}

/// One `LABEL: value` row.
fn entry<'a>(label: &'a str, value: String, tone: Tone, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), theme.tone_style(tone)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

/// Node status, version, epoch, uptime and downloader workers.
pub fn render_node_info(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.snapshot;
    let theme = &app.theme;
    let status = state.node_status();
    let tone = status_tone(&status);

    let lines = vec![
        entry("STATUS", status, tone, theme),
        entry("VERSION", state.display(Field::BuildVersion), Tone::Info, theme),
        entry("EPOCH", state.epoch_display(), Tone::Good, theme),
        entry("UPTIME", state.uptime_display(), Tone::Info, theme),
        entry("WORKERS", state.display(Field::DownloaderWorkers), Tone::Good, theme),
    ];

    let paragraph = Paragraph::new(lines).block(panel("NODE INFO", Tone::Info, theme));
    frame.render_widget(paragraph, area);
}

/// Shard summary from the health endpoint plus the blob recovery backlog.
pub fn render_shards(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.snapshot;
    let theme = &app.theme;

    let shard = |pick: fn(&crate::data::ShardSummary) -> u64| -> String {
        state
            .health()
            .map(|h| pick(&h.shards).to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    let lines = vec![
        entry("OWNED", shard(|s| s.owned), Tone::Info, theme),
        entry("READY", shard(|s| s.ready), Tone::Good, theme),
        entry("UNKNOWN", shard(|s| s.unknown), Tone::Warn, theme),
        entry("inRECOVERY", shard(|s| s.in_recovery), Tone::Warn, theme),
        entry("inTRANSFER", shard(|s| s.in_transfer), Tone::Warn, theme),
        entry("BACKLOG", state.display(Field::BacklogQueued), Tone::Warn, theme),
        entry("RECOVERING", state.display(Field::BacklogInProgress), Tone::Warn, theme),
    ];

    let paragraph = Paragraph::new(lines).block(panel("SHARDS", Tone::Info, theme));
    frame.render_widget(paragraph, area);
}

/// Headline number for a field, with thousands separators.
pub fn headline(app: &App, field: Field) -> String {
    match app.snapshot.count(field) {
        Some(n) => format_thousands(n),
        None => app.snapshot.display(field),
    }
}

/// Size in cells of one quadrant-pixel glyph (8x8 pixels, 2x2 per cell).
const GLYPH_WIDTH: u16 = 4;
const GLYPH_HEIGHT: u16 = 4;

/// Whether `text` can be drawn with large glyphs inside `area`.
pub fn fits_big_text(text: &str, area: Rect) -> bool {
    let width = text.chars().count() as u16 * GLYPH_WIDTH;
    area.height >= GLYPH_HEIGHT && area.width >= width
}

/// A single large value centered in its panel.
///
/// Drawn with block glyphs when the panel is large enough, as plain bold text
/// otherwise.
pub fn render_big_number(frame: &mut Frame, app: &App, area: Rect, title: &str, field: Field) {
    let tone = match field {
        Field::CheckpointLag => lag_tone(app.snapshot.count(field)),
        Field::PersistedEvents => Tone::Good,
        _ => Tone::Info,
    };

    let block = panel(title, tone, &app.theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let value = headline(app, field);
    let style = app.theme.tone_style(tone);

    if fits_big_text(&value, inner) {
        let top = inner.y + (inner.height - GLYPH_HEIGHT) / 2;
        let glyphs = Rect::new(inner.x, top, inner.width, GLYPH_HEIGHT);
        let big = BigText::builder()
            .pixel_size(PixelSize::Quadrant)
            .style(style)
            .alignment(Alignment::Center)
            .lines(vec![Line::from(value)])
            .build();
        frame.render_widget(big, glyphs);
    } else {
        let top = inner.y + inner.height.saturating_sub(1) / 2;
        let row = Rect::new(inner.x, top, inner.width, inner.height.min(1));
        let paragraph = Paragraph::new(Span::styled(value, style)).alignment(Alignment::Center);
        frame.render_widget(paragraph, row);
    }
}

/// The most recent application log lines.
pub fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("APP LOGS", Tone::Info, &app.theme)
        .border_style(Style::default().fg(app.theme.border));
    let visible = block.inner(area).height as usize;

    let lines = app.logs.lines();
    let skip = lines.len().saturating_sub(visible);
    let text: Vec<Line> = lines
        .into_iter()
        .skip(skip)
        .map(|line| Line::styled(line, app.theme.muted))
        .collect();

    frame.render_widget(Paragraph::new(text).block(block), area);
}
