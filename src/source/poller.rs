//! Drives the refresh schedule and writes fetch results into the shared state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{RefreshScheduler, SourceId, Transport, TransportError};
use crate::data::{Extraction, HealthDecodeError, HealthSnapshot, SharedState};

/// Why a fetch produced no update.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] HealthDecodeError),
}

/// URLs of the polled endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub metrics_url: String,
    pub health_url: String,
}

impl Endpoints {
    /// Build endpoints from the metrics URL and the RPC base URL.
    pub fn new(metrics_url: &str, rpc_url: &str) -> Self {
        Self {
            metrics_url: metrics_url.to_string(),
            health_url: format!("{}/v1/health", rpc_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self, source: SourceId) -> &str {
        match source {
            SourceId::Telemetry => &self.metrics_url,
            SourceId::Health => &self.health_url,
        }
    }
}

/// Completion report sent by a fetch task.
#[derive(Debug)]
struct Outcome {
    source: SourceId,
    started: Instant,
    success: bool,
}

/// Decoded payload ready to be applied to the state.
enum Update {
    Telemetry(Extraction),
    Health(HealthSnapshot),
}

/// Polls the node's endpoints on independent schedules.
///
/// [`Poller::tick`] is called once per frame. It never waits for a fetch:
/// due sources are fetched on spawned tasks, and their completion is picked up
/// by a later tick. A source with a fetch still in flight is not fetched again.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Poller {
    transport: Arc<dyn Transport>,
    state: SharedState,
    scheduler: RefreshScheduler,
    endpoints: Endpoints,
    timeout: Duration,
    in_flight: HashMap<SourceId, JoinHandle<()>>,
    outcomes_tx: mpsc::UnboundedSender<Outcome>,
    outcomes_rx: mpsc::UnboundedReceiver<Outcome>,
    attempts: HashMap<SourceId, u64>,
}

impl Poller {
    pub fn new(
        transport: Arc<dyn Transport>,
        state: SharedState,
        scheduler: RefreshScheduler,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            state,
            scheduler,
            endpoints,
            timeout,
            in_flight: HashMap::new(),
            outcomes_tx,
            outcomes_rx,
            attempts: HashMap::new(),
        }
    }

    /// Run one scheduling pass at `now`.
    ///
    /// Returns the sources for which a fetch was started.
    pub fn tick(&mut self, now: Instant) -> Vec<SourceId> {
        self.collect_outcomes();

        let mut started = Vec::new();
        for source in SourceId::ALL {
            if self.in_flight.contains_key(&source) || !self.scheduler.is_due(source, now) {
                continue;
            }
            self.spawn_fetch(source, now);
            started.push(source);
        }
        started
    }

    /// Make every source due on the next tick.
    pub fn force_refresh(&mut self) {
        info!("manual refresh requested");
        self.scheduler.reset_all();
    }

    /// Wait for all in-flight fetches and record their outcomes.
    pub async fn settle(&mut self) {
        for handle in self.in_flight.values_mut() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!("fetch task panicked");
                }
            }
        }
        self.collect_outcomes();
    }

    /// Abort every in-flight fetch.
    pub fn shutdown(&mut self) {
        for (source, handle) in self.in_flight.drain() {
            debug!(source = source.label(), "aborting in-flight fetch");
            handle.abort();
        }
    }

    /// Number of fetches started for `source` since creation.
    pub fn attempts(&self, source: SourceId) -> u64 {
        self.attempts.get(&source).copied().unwrap_or(0)
    }

    pub fn is_in_flight(&self, source: SourceId) -> bool {
        self.in_flight.contains_key(&source)
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn collect_outcomes(&mut self) {
        self.in_flight.retain(|_, handle| !handle.is_finished());

        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            if outcome.success {
                self.scheduler.mark_success(outcome.source, outcome.started);
            }
        }
    }

    fn spawn_fetch(&mut self, source: SourceId, now: Instant) {
        *self.attempts.entry(source).or_default() += 1;

        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let tx = self.outcomes_tx.clone();
        let url = self.endpoints.url(source).to_string();
        let timeout = self.timeout;

        let handle = tokio::spawn(async move {
            let success = refresh(source, transport.as_ref(), &state, &url, timeout).await;
            let _ = tx.send(Outcome {
                source,
                started: now,
                success,
            });
        });
        self.in_flight.insert(source, handle);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Fetch one source and apply the result. Returns whether it succeeded.
async fn refresh(
    source: SourceId,
    transport: &dyn Transport,
    state: &SharedState,
    url: &str,
    timeout: Duration,
) -> bool {
    let result = match tokio::time::timeout(timeout, fetch(source, transport, url, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Transport(TransportError::Timeout)),
    };

    match result {
        Ok(Update::Telemetry(extraction)) => {
            info!(
                missing = extraction.absent().count(),
                "fetched node metrics"
            );
            state.write().apply_telemetry(&extraction, Instant::now());
            true
        }
        Ok(Update::Health(health)) => {
            info!(status = %health.node_status, epoch = health.epoch, "fetched node health");
            state.write().apply_health(health, Instant::now());
            true
        }
        Err(e) => {
            error!(source = source.label(), url, "fetch failed: {}", e);
            state.write().record_failure(source, e.to_string());
            false
        }
    }
}

async fn fetch(
    source: SourceId,
    transport: &dyn Transport,
    url: &str,
    timeout: Duration,
) -> Result<Update, FetchError> {
    match source {
        SourceId::Telemetry => {
            let text = transport.fetch_text(url, timeout).await?;
            Ok(Update::Telemetry(Extraction::from_text(&text)))
        }
        SourceId::Health => {
            let document = transport.fetch_json(url, timeout).await?;
            Ok(Update::Health(HealthSnapshot::from_document(document)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DashboardState, Field};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Behavior {
        Succeed,
        Fail,
        Hang,
    }

    #[derive(Debug)]
    struct ScriptedTransport {
        text: Mutex<(Behavior, String)>,
        json: Mutex<(Behavior, serde_json::Value)>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new() -> Self {
            Self {
                text: Mutex::new((Behavior::Succeed, METRICS.to_string())),
                json: Mutex::new((Behavior::Succeed, health_doc())),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn set_text(&self, behavior: Behavior, body: &str) {
            *self.text.lock() = (behavior, body.to_string());
        }

        fn set_json(&self, behavior: Behavior, body: serde_json::Value) {
            *self.json.lock() = (behavior, body);
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String, TransportError> {
            self.urls.lock().push(url.to_string());
            let (behavior, body) = self.text.lock().clone();
            match behavior {
                Behavior::Succeed => Ok(body),
                Behavior::Fail => Err(TransportError::Status(500)),
                Behavior::Hang => std::future::pending().await,
            }
        }

        async fn fetch_json(
            &self,
            url: &str,
            _timeout: Duration,
        ) -> Result<serde_json::Value, TransportError> {
            self.urls.lock().push(url.to_string());
            let (behavior, body) = self.json.lock().clone();
            match behavior {
                Behavior::Succeed => Ok(body),
                Behavior::Fail => Err(TransportError::Connection("refused".to_string())),
                Behavior::Hang => std::future::pending().await,
            }
        }
    }

    const METRICS: &str = "checkpoint_downloader_checkpoint_lag 4\n\
                           event_processor_latest_downloaded_checkpoint 100\n";

    fn health_doc() -> serde_json::Value {
        json!({
            "success": {
                "data": {
                    "nodeStatus": "Active",
                    "epoch": 9,
                    "shardSummary": {
                        "owned": 3,
                        "ownedShardStatus": {
                            "ready": 3, "inTransfer": 0, "inRecovery": 0, "unknown": 0
                        }
                    }
                }
            }
        })
    }

    fn poller(transport: Arc<ScriptedTransport>, timeout: Duration) -> (Poller, SharedState) {
        let state = DashboardState::shared(10);
        let poller = Poller::new(
            transport,
            Arc::clone(&state),
            RefreshScheduler::new(Duration::from_secs(2), Duration::from_secs(20)),
            Endpoints::new("http://node:9184/metrics", "http://node:9185/"),
            timeout,
        );
        (poller, state)
    }

    /// Tick at 5 Hz for 21 simulated seconds, letting each tick's fetches finish.
    async fn run_simulation(poller: &mut Poller) -> u64 {
        let start = Instant::now();
        let frame = Duration::from_millis(200);
        let mut ticks = 0;
        while frame * ticks < Duration::from_secs(21) {
            poller.tick(start + frame * ticks);
            poller.settle().await;
            ticks += 1;
        }
        u64::from(ticks)
    }

    #[test]
    fn test_endpoints() {
        let endpoints = Endpoints::new("http://node:9184/metrics", "https://node:9185/");
        assert_eq!(endpoints.url(SourceId::Telemetry), "http://node:9184/metrics");
        assert_eq!(endpoints.url(SourceId::Health), "https://node:9185/v1/health");
    }

    #[tokio::test]
    async fn test_independent_cadences() {
        let transport = Arc::new(ScriptedTransport::new());
        let (mut poller, _state) = poller(Arc::clone(&transport), Duration::from_secs(3));

        run_simulation(&mut poller).await;

        let telemetry = poller.attempts(SourceId::Telemetry);
        let health = poller.attempts(SourceId::Health);
        assert!((10..=11).contains(&telemetry), "telemetry attempts: {}", telemetry);
        assert!((1..=2).contains(&health), "health attempts: {}", health);
    }

    #[tokio::test]
    async fn test_failing_health_does_not_slow_telemetry() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_json(Behavior::Fail, json!(null));
        let (mut poller, state) = poller(Arc::clone(&transport), Duration::from_secs(3));

        let ticks = run_simulation(&mut poller).await;

        let telemetry = poller.attempts(SourceId::Telemetry);
        assert!((10..=11).contains(&telemetry), "telemetry attempts: {}", telemetry);
        // A failed source is retried on every tick.
        assert_eq!(poller.attempts(SourceId::Health), ticks);
        assert_eq!(poller.scheduler().last_success(SourceId::Health), None);
        assert_eq!(state.read().status(SourceId::Health).failures, ticks);
    }

    #[tokio::test]
    async fn test_success_updates_state() {
        let transport = Arc::new(ScriptedTransport::new());
        let (mut poller, state) = poller(Arc::clone(&transport), Duration::from_secs(3));

        let started = poller.tick(Instant::now());
        assert_eq!(started, vec![SourceId::Telemetry, SourceId::Health]);
        poller.settle().await;

        let state = state.read();
        assert_eq!(state.count(Field::CheckpointLag), Some(4));
        assert_eq!(state.node_status(), "Active");
        assert_eq!(state.epoch_display(), "9");

        let urls = transport.urls.lock();
        assert!(urls.contains(&"http://node:9184/metrics".to_string()));
        assert!(urls.contains(&"http://node:9185/v1/health".to_string()));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_values() {
        let transport = Arc::new(ScriptedTransport::new());
        let (mut poller, state) = poller(Arc::clone(&transport), Duration::from_secs(3));
        let start = Instant::now();

        poller.tick(start);
        poller.settle().await;

        transport.set_text(Behavior::Fail, "");
        let started = poller.tick(start + Duration::from_secs(2));
        assert_eq!(started, vec![SourceId::Telemetry]);
        poller.settle().await;

        let state = state.read();
        assert_eq!(state.count(Field::CheckpointLag), Some(4));
        assert_eq!(state.window(Field::CheckpointLag).unwrap().len(), 1);
        let status = state.status(SourceId::Telemetry);
        assert_eq!(status.failures, 1);
        assert!(status.last_error.as_deref().unwrap().contains("500"));
        assert_eq!(poller.scheduler().last_success(SourceId::Telemetry), Some(start));
    }

    #[tokio::test]
    async fn test_malformed_health_is_discarded_and_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut doc = health_doc();
        doc["success"]["data"]["shardSummary"]["ownedShardStatus"]
            .as_object_mut()
            .unwrap()
            .remove("unknown");
        transport.set_json(Behavior::Succeed, doc);
        let (mut poller, state) = poller(Arc::clone(&transport), Duration::from_secs(3));
        let start = Instant::now();

        poller.tick(start);
        poller.settle().await;
        assert!(state.read().health().is_none());
        assert!(state.read().status(SourceId::Health).last_error.is_some());

        let started = poller.tick(start + Duration::from_millis(200));
        assert_eq!(started, vec![SourceId::Health]);
    }

    #[tokio::test]
    async fn test_in_flight_fetch_is_not_duplicated() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_text(Behavior::Hang, "");
        let (mut poller, _state) = poller(Arc::clone(&transport), Duration::from_secs(3));
        let start = Instant::now();

        poller.tick(start);
        assert!(poller.is_in_flight(SourceId::Telemetry));
        let started = poller.tick(start + Duration::from_secs(5));
        assert!(!started.contains(&SourceId::Telemetry));
        assert_eq!(poller.attempts(SourceId::Telemetry), 1);

        poller.shutdown();
        assert!(!poller.is_in_flight(SourceId::Telemetry));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_fetch_times_out() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_text(Behavior::Hang, "");
        let (mut poller, state) = poller(Arc::clone(&transport), Duration::from_millis(50));

        poller.tick(Instant::now());
        poller.settle().await;

        let state = state.read();
        let status = state.status(SourceId::Telemetry);
        assert_eq!(status.failures, 1);
        assert_eq!(status.last_error.as_deref(), Some("request timed out"));
        assert!(state.health().is_some());
    }

    #[tokio::test]
    async fn test_successful_fetches_are_logged_at_info() {
        use crate::logging::{LogBuffer, LOG_PANEL_LINES};
        use tracing_subscriber::filter::LevelFilter;
        use tracing_subscriber::layer::SubscriberExt;

        let logs = LogBuffer::new(LOG_PANEL_LINES);
        let subscriber = tracing_subscriber::registry().with(LevelFilter::INFO).with(
            tracing_subscriber::fmt::layer()
                .with_writer(logs.clone())
                .with_ansi(false)
                .without_time(),
        );
        let _guard = tracing::subscriber::set_default(subscriber);

        let transport = Arc::new(ScriptedTransport::new());
        let (mut poller, _state) = poller(Arc::clone(&transport), Duration::from_secs(3));
        poller.tick(Instant::now());
        poller.settle().await;

        let lines = logs.lines();
        assert!(lines.iter().any(|l| l.contains("INFO") && l.contains("fetched node metrics")));
        assert!(lines.iter().any(|l| l.contains("INFO") && l.contains("fetched node health")));
    }

    #[tokio::test]
    async fn test_force_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        let (mut poller, _state) = poller(Arc::clone(&transport), Duration::from_secs(3));
        let start = Instant::now();

        poller.tick(start);
        poller.settle().await;
        assert!(poller.tick(start + Duration::from_millis(200)).is_empty());

        poller.force_refresh();
        let started = poller.tick(start + Duration::from_millis(400));
        assert_eq!(started, vec![SourceId::Telemetry, SourceId::Health]);
    }
}
