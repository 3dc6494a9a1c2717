//! Data models and processing for node telemetry and health.
//!
//! This module turns raw endpoint payloads into the state displayed by the
//! dashboard.
//!
//! ## Submodules
//!
//! - [`duration`]: Interval parsing (e.g., "2s", "500ms") and uptime formatting
//! - [`extract`]: Table-driven field extraction from Prometheus text
//! - [`health`]: Typed decoding of the `/v1/health` response
//! - [`state`]: The shared [`DashboardState`]
//! - [`window`]: Bounded [`RollingWindow`] history for charts
//!
//! ## Data Flow
//!
//! ```text
//! /metrics text ──▶ Extraction::from_text() ──┐
//!                                             ├──▶ DashboardState ──▶ ui
//! /v1/health JSON ─▶ HealthSnapshot ──────────┘        │
//!                                                      └──▶ RollingWindow (charts)
//! ```

pub mod duration;
pub mod extract;
pub mod health;
pub mod state;
pub mod window;

pub use extract::{AbsencePolicy, Extraction, Field, FieldSpec, FieldValue, TelemetrySnapshot};
pub use health::{HealthDecodeError, HealthSnapshot, ShardSummary};
pub use state::{DashboardState, Reading, SharedState, SourceStatus, NOT_AVAILABLE};
pub use window::RollingWindow;
