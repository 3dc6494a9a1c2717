//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`panels`]: Top row panels (node info, shards, headline numbers, logs)
//! - [`charts`]: Line charts over the rolling windows
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (common::render_header)                               │
//! ├────────┬──────┬─────────┬───────────┬────────────┬───────────┤
//! │ Node   │Shards│ Lag     │ Persisted │ Downloaded │ App Logs  │
//! ├────────┴──────┴──┬──────┴───────────┴──┬─────────┴───────────┤
//! │ Latest Checkpoint│ Lag │ Confirmations │ Recovery Backlog    │
//! ├──────────────────┴──────┬──────────────┴─────┬───────────────┤
//! │ Persisted Events        │ Pending Events     │ Highest Fin.  │
//! ├─────────────────────────┴────────────────────┴───────────────┤
//! │ Status Bar (common::render_status_bar)                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod charts;
pub mod common;
pub mod panels;
pub mod theme;

pub use theme::{Theme, Tone};

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::data::Field;

/// Minimum terminal size for a usable display.
pub const MIN_WIDTH: u16 = 100;
pub const MIN_HEIGHT: u16 = 24;

/// Draw one frame from the app's current snapshot.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let top = (area.height / 2).saturating_sub(2);
        let centered = Rect::new(0, top, area.width, 5.min(area.height - top));
        frame.render_widget(paragraph, centered);
        return;
    }

    let rows = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Fill(2),   // Panels
        Constraint::Fill(3),   // Charts
        Constraint::Fill(3),   // Charts
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, rows[0]);

    let top = Layout::horizontal([
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(3),
        Constraint::Fill(3),
        Constraint::Fill(3),
        Constraint::Fill(2),
    ])
    .split(rows[1]);

    panels::render_node_info(frame, app, top[0]);
    panels::render_shards(frame, app, top[1]);
    panels::render_big_number(frame, app, top[2], "CHECKPOINTS LAG", Field::CheckpointLag);
    panels::render_big_number(frame, app, top[3], "PERSISTED EVENTS", Field::PersistedEvents);
    panels::render_big_number(
        frame,
        app,
        top[4],
        "TOTAL DOWNLOADED CHECKPOINTS",
        Field::DownloadedCheckpoints,
    );
    panels::render_logs(frame, app, top[5]);

    let middle = Layout::horizontal([Constraint::Fill(1); 4]).split(rows[2]);
    charts::render_chart(frame, app, middle[0], Field::LatestCheckpoint, Tone::Good);
    charts::render_chart(frame, app, middle[1], Field::CheckpointLag, Tone::Bad);
    charts::render_chart(frame, app, middle[2], Field::ConfirmationsIssued, Tone::Info);
    charts::render_chart(frame, app, middle[3], Field::BacklogQueued, Tone::Warn);

    let bottom = Layout::horizontal([Constraint::Fill(1); 3]).split(rows[3]);
    charts::render_chart(frame, app, bottom[0], Field::PersistedEvents, Tone::Good);
    charts::render_chart(frame, app, bottom[1], Field::PendingEvents, Tone::Bad);
    charts::render_chart(frame, app, bottom[2], Field::HighestFinishedEvent, Tone::Info);

    common::render_status_bar(frame, app, rows[4]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::data::Extraction;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Instant;

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_panels() {
        let mut app = test_app();
        app.snapshot.apply_telemetry(
            &Extraction::from_text(
                "checkpoint_downloader_checkpoint_lag 0\n\
                 event_processor_total_downloaded_checkpoints 4500\n",
            ),
            Instant::now(),
        );

        let screen = draw(&app, 160, 40);
        assert!(screen.contains("WALRUS STORAGE NODE"));
        assert!(screen.contains("NODE INFO"));
        assert!(screen.contains("SHARDS"));
        assert!(screen.contains("TOTAL DOWNLOADED CHECKPOINTS"));
        assert!(screen.contains("Latest Checkpoint"));
        assert!(screen.contains("Highest Finished Event"));
        assert!(screen.contains("q:quit"));
    }

    #[test]
    fn test_small_terminal_shows_message() {
        let app = test_app();
        let screen = draw(&app, 40, 10);
        assert!(screen.contains("Terminal too small"));
    }

    #[test]
    fn test_help_overlay() {
        let mut app = test_app();
        app.toggle_help();
        let screen = draw(&app, 160, 40);
        assert!(screen.contains("Keyboard Shortcuts"));
    }
}
