//! # walrus-dashboard
//!
//! A terminal dashboard for monitoring a Walrus storage node.
//!
//! The dashboard polls two endpoints of a node on independent schedules: the
//! Prometheus text exposition (`/metrics`) and the REST health route
//! (`/v1/health`). Tracked values are extracted from each payload, kept in
//! bounded rolling windows for charting, and redrawn at a fixed frame rate.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐  tick   ┌──────────┐  spawn   ┌───────────────┐ │
//! │  │   app   │────────▶│  source  │─────────▶│ fetch tasks   │ │
//! │  │ (frame) │         │ (Poller) │◀─────────│ (Transport)   │ │
//! │  └────┬────┘         └──────────┘ outcomes └───────┬───────┘ │
//! │       │ clone                                      │ write   │
//! │       ▼                                            ▼         │
//! │  ┌─────────┐         ┌─────────────────────────────────────┐ │
//! │  │   ui    │◀────────│ data (DashboardState, windows)      │ │
//! │  └─────────┘         └─────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Per-frame state, key actions and export
//! - **[`source`]**: The [`Transport`] trait, its HTTP implementation, the
//!   refresh scheduler and the [`Poller`]
//! - **[`data`]**: Metric extraction, health decoding, rolling windows and the
//!   shared [`DashboardState`]
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]** / **[`logging`]**: Layered configuration and the tracing
//!   setup feeding the log panel
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Local node with default ports
//! walrus-dashboard
//!
//! # Remote node with a self-signed certificate
//! walrus-dashboard --metrics-url http://node:9184/metrics \
//!     --rpc-url https://node:9185 --insecure
//! ```
//!
//! ### Extracting values from a metrics payload
//!
//! ```
//! use walrus_dashboard::{Extraction, Field};
//!
//! let text = "checkpoint_downloader_checkpoint_lag 3\n";
//! let extraction = Extraction::from_text(text);
//! assert_eq!(extraction.count(Field::CheckpointLag), Some(3));
//! assert_eq!(extraction.count(Field::Epoch), None);
//! ```
//!
//! ### Polling a node
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//! use walrus_dashboard::source::{Endpoints, HttpTransport, Poller, RefreshScheduler};
//! use walrus_dashboard::DashboardState;
//!
//! # tokio_test::block_on(async {
//! let state = DashboardState::shared(60);
//! let mut poller = Poller::new(
//!     Arc::new(HttpTransport::new(false).unwrap()),
//!     Arc::clone(&state),
//!     RefreshScheduler::new(Duration::from_secs(2), Duration::from_secs(20)),
//!     Endpoints::new("http://127.0.0.1:9184/metrics", "http://127.0.0.1:9185"),
//!     Duration::from_secs(3),
//! );
//!
//! poller.tick(Instant::now());
//! poller.settle().await;
//! println!("status: {}", state.read().node_status());
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::DashboardConfig;
pub use data::{
    DashboardState, Extraction, Field, FieldValue, HealthSnapshot, RollingWindow, SharedState,
};
pub use source::{Poller, SourceId, Transport, TransportError};
