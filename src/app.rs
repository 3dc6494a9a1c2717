//! Application state and user interaction logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::data::{DashboardState, SharedState};
use crate::logging::LogBuffer;
use crate::source::{Poller, SourceId};
use crate::ui::Theme;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Default export target for the `e` key.
pub const EXPORT_PATH: &str = "dashboard_export.json";

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    poller: Poller,
    state: SharedState,
    /// Copy of the shared state taken at the start of the frame.
    pub snapshot: DashboardState,
    pub logs: LogBuffer,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app drawing from `state`, which `poller` keeps up to date.
    pub fn new(poller: Poller, state: SharedState, logs: LogBuffer, theme: Theme) -> Self {
        let snapshot = state.read().clone();
        Self {
            running: true,
            show_help: false,
            poller,
            state,
            snapshot,
            logs,
            theme,
            status_message: None,
        }
    }

    /// Advance one frame: start due fetches and refresh the snapshot.
    pub fn tick(&mut self, now: Instant) {
        self.poller.tick(now);
        self.snapshot = self.state.read().clone();
    }

    /// Fetch both sources on the next tick, regardless of their schedule.
    pub fn refresh_now(&mut self) {
        self.poller.force_refresh();
        self.set_status_message("Refreshing...".to_string());
    }

    /// Endpoint URL polled for `source`.
    pub fn endpoint(&self, source: SourceId) -> &str {
        self.poller.endpoints().url(source)
    }

    /// Time since the last successful update of `source`.
    pub fn since_update(&self, source: SourceId) -> Option<Duration> {
        self.snapshot
            .status(source)
            .last_update
            .map(|at| at.elapsed())
    }

    pub fn is_fetching(&self, source: SourceId) -> bool {
        self.poller.is_in_flight(source)
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Abort in-flight fetches.
    pub fn shutdown(&mut self) {
        self.poller.shutdown();
    }

    /// Export the current state to a file as pretty-printed JSON.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.state.read())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
