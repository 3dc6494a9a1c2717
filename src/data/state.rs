//! The dashboard's mutable aggregate of everything it displays.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{error, warn};

use super::duration::format_uptime;
use super::extract::{AbsencePolicy, Extraction, Field, FieldValue, TRACKED_FIELDS};
use super::health::HealthSnapshot;
use super::window::RollingWindow;
use crate::source::SourceId;

/// Placeholder shown for values that are unknown or unavailable.
pub const NOT_AVAILABLE: &str = "N/A";

/// State shared between the poller (writer) and the renderer (reader).
pub type SharedState = Arc<RwLock<DashboardState>>;

/// Current reading of a telemetry field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    /// Never reported since startup.
    Unknown,
    /// Missing from the latest telemetry fetch.
    Unavailable,
    Value(FieldValue),
}

/// Bookkeeping for one polled source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStatus {
    #[serde(skip)]
    pub last_update: Option<Instant>,
    pub last_error: Option<String>,
    pub successes: u64,
    pub failures: u64,
}

impl SourceStatus {
    fn succeeded(&mut self, at: Instant) {
        self.last_update = Some(at);
        self.last_error = None;
        self.successes += 1;
    }

    fn failed(&mut self, message: String) {
        self.last_error = Some(message);
        self.failures += 1;
    }
}

/// Everything the dashboard displays: latest telemetry readings, chart
/// history, and the latest node health.
///
/// Created once at startup with every field unknown and mutated in place by
/// the poller. Each `apply_*` call is a complete update for one fetch, so a
/// reader holding the lock never sees half of a decode pass.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardState {
    readings: BTreeMap<Field, Reading>,
    windows: BTreeMap<Field, RollingWindow<u64>>,
    health: Option<HealthSnapshot>,
    telemetry_status: SourceStatus,
    health_status: SourceStatus,
}

impl DashboardState {
    /// Create an empty state whose charts keep `graph_size` readings.
    pub fn new(graph_size: usize) -> Self {
        let readings = TRACKED_FIELDS
            .iter()
            .map(|spec| (spec.field, Reading::Unknown))
            .collect();
        let windows = TRACKED_FIELDS
            .iter()
            .filter(|spec| spec.chart)
            .map(|spec| (spec.field, RollingWindow::new(graph_size)))
            .collect();
        Self {
            readings,
            windows,
            health: None,
            telemetry_status: SourceStatus::default(),
            health_status: SourceStatus::default(),
        }
    }

    /// Wrap a fresh state for sharing with the poller.
    pub fn shared(graph_size: usize) -> SharedState {
        Arc::new(RwLock::new(Self::new(graph_size)))
    }

    /// Apply one successful telemetry fetch.
    ///
    /// Present values replace the current reading and are appended to the
    /// field's chart. Absent values follow the field's [`AbsencePolicy`]; only
    /// [`AbsencePolicy::Zero`] fields record anything in their chart.
    pub fn apply_telemetry(&mut self, extraction: &Extraction, at: Instant) {
        for spec in TRACKED_FIELDS {
            match extraction.get(spec.field) {
                Some(FieldValue::Text(raw)) if spec.rule.is_numeric() => {
                    error!(field = spec.field.label(), value = %raw, "unusable reading");
                    self.readings.insert(spec.field, Reading::Unavailable);
                }
                Some(value) => {
                    if let (Some(n), Some(window)) =
                        (value.as_count(), self.windows.get_mut(&spec.field))
                    {
                        window.push(n);
                    }
                    self.readings.insert(spec.field, Reading::Value(value.clone()));
                }
                None => match spec.absence {
                    AbsencePolicy::KeepLast => {}
                    AbsencePolicy::NotAvailable => {
                        self.readings.insert(spec.field, Reading::Unavailable);
                    }
                    AbsencePolicy::Zero => {
                        warn!(field = spec.field.label(), "metric missing from telemetry, recording 0");
                        if let Some(window) = self.windows.get_mut(&spec.field) {
                            window.push(0);
                        }
                        self.readings
                            .insert(spec.field, Reading::Value(FieldValue::Count(0)));
                    }
                },
            }
        }
        self.telemetry_status.succeeded(at);
    }

    /// Apply one successful health fetch.
    pub fn apply_health(&mut self, health: HealthSnapshot, at: Instant) {
        self.health = Some(health);
        self.health_status.succeeded(at);
    }

    /// Record a failed fetch. Previously displayed values are kept.
    pub fn record_failure(&mut self, source: SourceId, message: String) {
        self.status_mut(source).failed(message);
    }

    pub fn reading(&self, field: Field) -> &Reading {
        self.readings.get(&field).unwrap_or(&Reading::Unknown)
    }

    /// Latest numeric value of a field, if one is known.
    pub fn count(&self, field: Field) -> Option<u64> {
        match self.reading(field) {
            Reading::Value(value) => value.as_count(),
            _ => None,
        }
    }

    /// Latest value of a field formatted for display.
    pub fn display(&self, field: Field) -> String {
        match self.reading(field) {
            Reading::Value(value) => value.to_string(),
            Reading::Unknown | Reading::Unavailable => NOT_AVAILABLE.to_string(),
        }
    }

    /// Chart history of a field; `None` for fields that are not charted.
    pub fn window(&self, field: Field) -> Option<&RollingWindow<u64>> {
        self.windows.get(&field)
    }

    pub fn health(&self) -> Option<&HealthSnapshot> {
        self.health.as_ref()
    }

    pub fn status(&self, source: SourceId) -> &SourceStatus {
        match source {
            SourceId::Telemetry => &self.telemetry_status,
            SourceId::Health => &self.health_status,
        }
    }

    fn status_mut(&mut self, source: SourceId) -> &mut SourceStatus {
        match source {
            SourceId::Telemetry => &mut self.telemetry_status,
            SourceId::Health => &mut self.health_status,
        }
    }

    /// Node uptime as a human readable string, or `"N/A"`.
    pub fn uptime_display(&self) -> String {
        match self.reading(Field::Uptime) {
            Reading::Value(FieldValue::Count(0)) => NOT_AVAILABLE.to_string(),
            Reading::Value(FieldValue::Count(seconds)) => format_uptime(*seconds),
            _ => NOT_AVAILABLE.to_string(),
        }
    }

    /// Node status from the health endpoint.
    pub fn node_status(&self) -> String {
        self.health
            .as_ref()
            .map(|h| h.node_status.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Current epoch, preferring the health endpoint over telemetry.
    pub fn epoch_display(&self) -> String {
        match &self.health {
            Some(health) => health.epoch.to_string(),
            None => self.display(Field::Epoch),
        }
    }
}
