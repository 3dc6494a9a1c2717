//! Dashboard configuration.
//!
//! Settings are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. environment variables prefixed with `WALRUS_DASHBOARD_`
//!    (e.g. `WALRUS_DASHBOARD_METRICS_URL`)
//! 4. command-line flags
//!
//! ```toml
//! metrics_url = "http://127.0.0.1:9184/metrics"
//! rpc_url = "https://127.0.0.1:9185"
//! metrics_refresh = "2s"
//! rpc_refresh = "20s"
//! refresh_per_second = 5.0
//! graph_size = 60
//! insecure_tls = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::Level;

use crate::data::duration::parse_interval;
use crate::logging::parse_level;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "WALRUS_DASHBOARD";

pub const DEFAULT_METRICS_URL: &str = "http://127.0.0.1:9184/metrics";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9185";
pub const DEFAULT_METRICS_REFRESH: &str = "2s";
pub const DEFAULT_RPC_REFRESH: &str = "20s";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "3s";
pub const DEFAULT_REFRESH_PER_SECOND: f64 = 5.0;
pub const DEFAULT_GRAPH_SIZE: usize = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings as read from the configuration layers, before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    metrics_url: String,
    rpc_url: String,
    metrics_refresh: String,
    rpc_refresh: String,
    request_timeout: String,
    refresh_per_second: f64,
    graph_size: usize,
    insecure_tls: bool,
    log_level: String,
    log_file: Option<PathBuf>,
}

/// Values given on the command line; `None` leaves the lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub metrics_url: Option<String>,
    pub rpc_url: Option<String>,
    pub metrics_refresh: Option<String>,
    pub rpc_refresh: Option<String>,
    pub request_timeout: Option<String>,
    pub refresh_per_second: Option<f64>,
    pub graph_size: Option<usize>,
    pub insecure_tls: Option<bool>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Validated dashboard configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Prometheus metrics endpoint.
    pub metrics_url: String,
    /// Base URL of the node's REST API; health is read from `/v1/health`.
    pub rpc_url: String,
    pub metrics_refresh: Duration,
    pub rpc_refresh: Duration,
    /// Upper bound on each fetch.
    pub request_timeout: Duration,
    /// Frames drawn per second.
    pub refresh_per_second: f64,
    /// Number of readings kept per chart.
    pub graph_size: usize,
    /// Skip TLS certificate verification.
    pub insecure_tls: bool,
    pub log_level: Level,
    pub log_file: Option<PathBuf>,
    frame_interval: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            metrics_url: DEFAULT_METRICS_URL.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            metrics_refresh: Duration::from_secs(2),
            rpc_refresh: Duration::from_secs(20),
            request_timeout: Duration::from_secs(3),
            refresh_per_second: DEFAULT_REFRESH_PER_SECOND,
            graph_size: DEFAULT_GRAPH_SIZE,
            insecure_tls: false,
            log_level: Level::INFO,
            log_file: None,
            frame_interval: Duration::from_millis(200),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from defaults, an optional file, the environment
    /// and command-line overrides.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("metrics_url", DEFAULT_METRICS_URL)?
            .set_default("rpc_url", DEFAULT_RPC_URL)?
            .set_default("metrics_refresh", DEFAULT_METRICS_REFRESH)?
            .set_default("rpc_refresh", DEFAULT_RPC_REFRESH)?
            .set_default("request_timeout", DEFAULT_REQUEST_TIMEOUT)?
            .set_default("refresh_per_second", DEFAULT_REFRESH_PER_SECOND)?
            .set_default("graph_size", DEFAULT_GRAPH_SIZE as i64)?
            .set_default("insecure_tls", false)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let raw: RawConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("metrics_url", overrides.metrics_url.clone())?
            .set_override_option("rpc_url", overrides.rpc_url.clone())?
            .set_override_option("metrics_refresh", overrides.metrics_refresh.clone())?
            .set_override_option("rpc_refresh", overrides.rpc_refresh.clone())?
            .set_override_option("request_timeout", overrides.request_timeout.clone())?
            .set_override_option("refresh_per_second", overrides.refresh_per_second)?
            .set_override_option("graph_size", overrides.graph_size.map(|n| n as i64))?
            .set_override_option("insecure_tls", overrides.insecure_tls)?
            .set_override_option("log_level", overrides.log_level.clone())?
            .set_override_option(
                "log_file",
                overrides.log_file.as_ref().map(|p| p.display().to_string()),
            )?
            .build()?
            .try_deserialize()
            .context("Invalid configuration")?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        for (name, url) in [("metrics_url", &raw.metrics_url), ("rpc_url", &raw.rpc_url)] {
            reqwest::Url::parse(url).with_context(|| format!("Invalid {}: {}", name, url))?;
        }

        let metrics_refresh =
            parse_interval(&raw.metrics_refresh).context("Invalid metrics_refresh")?;
        let rpc_refresh = parse_interval(&raw.rpc_refresh).context("Invalid rpc_refresh")?;
        let request_timeout =
            parse_interval(&raw.request_timeout).context("Invalid request_timeout")?;

        ensure!(!metrics_refresh.is_zero(), "metrics_refresh must be positive");
        ensure!(!rpc_refresh.is_zero(), "rpc_refresh must be positive");
        ensure!(!request_timeout.is_zero(), "request_timeout must be positive");
        ensure!(
            raw.refresh_per_second.is_finite() && raw.refresh_per_second > 0.0,
            "refresh_per_second must be positive"
        );
        ensure!(raw.graph_size >= 1, "graph_size must be at least 1");
        let frame_interval = Duration::try_from_secs_f64(1.0 / raw.refresh_per_second)
            .with_context(|| {
                format!("refresh_per_second too small: {}", raw.refresh_per_second)
            })?;
        ensure!(!frame_interval.is_zero(), "refresh_per_second too large");

        Ok(Self {
            metrics_url: raw.metrics_url,
            rpc_url: raw.rpc_url,
            metrics_refresh,
            rpc_refresh,
            request_timeout,
            refresh_per_second: raw.refresh_per_second,
            graph_size: raw.graph_size,
            insecure_tls: raw.insecure_tls,
            log_level: parse_level(&raw.log_level)?,
            log_file: raw.log_file,
            frame_interval,
        })
    }

    /// Time between two frames.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::load(None, &Overrides::default()).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.frame_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file(
            r#"
            rpc_url = "https://node.example:9185"
            rpc_refresh = "30s"
            graph_size = 120
            insecure_tls = true
            log_level = "debug"
            "#,
        );

        let config = DashboardConfig::load(Some(file.path()), &Overrides::default()).unwrap();
        assert_eq!(config.rpc_url, "https://node.example:9185");
        assert_eq!(config.rpc_refresh, Duration::from_secs(30));
        assert_eq!(config.graph_size, 120);
        assert!(config.insecure_tls);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.metrics_url, DEFAULT_METRICS_URL);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = toml_file("graph_size = 120\nmetrics_refresh = \"10s\"\n");
        let overrides = Overrides {
            graph_size: Some(30),
            metrics_refresh: Some("500ms".to_string()),
            refresh_per_second: Some(2.0),
            ..Overrides::default()
        };

        let config = DashboardConfig::load(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.graph_size, 30);
        assert_eq!(config.metrics_refresh, Duration::from_millis(500));
        assert_eq!(config.frame_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let bad = [
            Overrides {
                metrics_refresh: Some("0".to_string()),
                ..Overrides::default()
            },
            Overrides {
                graph_size: Some(0),
                ..Overrides::default()
            },
            Overrides {
                refresh_per_second: Some(0.0),
                ..Overrides::default()
            },
            Overrides {
                refresh_per_second: Some(1e-300),
                ..Overrides::default()
            },
            Overrides {
                refresh_per_second: Some(1e300),
                ..Overrides::default()
            },
            Overrides {
                metrics_refresh: Some("1e30".to_string()),
                ..Overrides::default()
            },
            Overrides {
                rpc_url: Some("not a url".to_string()),
                ..Overrides::default()
            },
            Overrides {
                log_level: Some("loud".to_string()),
                ..Overrides::default()
            },
        ];

        for overrides in bad {
            assert!(
                DashboardConfig::load(None, &overrides).is_err(),
                "{:?} should be rejected",
                overrides
            );
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = Path::new("/nonexistent/walrus-dashboard.toml");
        assert!(DashboardConfig::load(Some(missing), &Overrides::default()).is_err());
    }
}
