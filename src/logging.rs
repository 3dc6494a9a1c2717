//! Logging setup.
//!
//! Log records go through `tracing`. While the dashboard owns the terminal
//! nothing may be written to stdout or stderr, so records are formatted into a
//! [`LogBuffer`] shown in the "App Logs" panel and, optionally, appended to a
//! log file.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Number of log lines kept for the log panel.
pub const LOG_PANEL_LINES: usize = 8;

/// Parse a log level name.
///
/// Accepts the `tracing` names (`trace`, `debug`, `info`, `warn`, `error`)
/// in any case, plus `warning` and `critical`.
pub fn parse_level(s: &str) -> Result<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "warning" => Ok(Level::WARN),
        "critical" => Ok(Level::ERROR),
        other => match Level::from_str(other) {
            Ok(level) => Ok(level),
            Err(_) => bail!("Invalid log level: {}", s),
        },
    }
}

/// The most recent formatted log lines, shared with the renderer.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append a line, dropping the oldest one when full.
    pub fn push(&self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.lines.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// Copy of the buffered lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }
}

/// Writer handed out per log record; its lines land in the buffer on drop.
pub struct LogLineWriter {
    buffer: LogBuffer,
    pending: Vec<u8>,
}

impl io::Write for LogLineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogLineWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.pending);
        for line in text.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            self.buffer.push(line);
        }
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogLineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogLineWriter {
            buffer: self.clone(),
            pending: Vec::new(),
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init(level: Level, log_file: Option<&Path>, panel: LogBuffer) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let panel_layer = fmt::layer()
        .with_writer(panel)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_writer(std::sync::Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(panel_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
