//! Per-source refresh timing.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::SourceId;

/// Last success and required interval for one source.
#[derive(Debug, Clone, Copy)]
struct RefreshTimer {
    interval: Duration,
    last_success: Option<Instant>,
}

/// Decides, each tick, which sources are due for a fetch.
///
/// A source is due when it has never been fetched successfully or when at
/// least its interval has passed since the last success. Failures are never
/// recorded, so a failed source is due again on the very next tick.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    timers: HashMap<SourceId, RefreshTimer>,
}

impl RefreshScheduler {
    /// Create a scheduler with one interval per source.
    pub fn new(telemetry_interval: Duration, health_interval: Duration) -> Self {
        let timer = |interval| RefreshTimer {
            interval,
            last_success: None,
        };
        let timers = HashMap::from([
            (SourceId::Telemetry, timer(telemetry_interval)),
            (SourceId::Health, timer(health_interval)),
        ]);
        Self { timers }
    }

    /// Whether `source` should be fetched at `now`.
    pub fn is_due(&self, source: SourceId, now: Instant) -> bool {
        let Some(timer) = self.timers.get(&source) else {
            return false;
        };
        match timer.last_success {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= timer.interval,
        }
    }

    /// Record a successful fetch of `source` at `at`.
    pub fn mark_success(&mut self, source: SourceId, at: Instant) {
        if let Some(timer) = self.timers.get_mut(&source) {
            timer.last_success = Some(at);
        }
    }

    /// Forget the last success of `source`, making it due immediately.
    pub fn reset(&mut self, source: SourceId) {
        if let Some(timer) = self.timers.get_mut(&source) {
            timer.last_success = None;
        }
    }

    pub fn reset_all(&mut self) {
        for timer in self.timers.values_mut() {
            timer.last_success = None;
        }
    }

    pub fn interval(&self, source: SourceId) -> Option<Duration> {
        self.timers.get(&source).map(|t| t.interval)
    }

    pub fn last_success(&self, source: SourceId) -> Option<Instant> {
        self.timers.get(&source).and_then(|t| t.last_success)
    }
}
