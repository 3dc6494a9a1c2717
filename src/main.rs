use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use walrus_dashboard::config::{DashboardConfig, Overrides};
use walrus_dashboard::logging::{self, LogBuffer, LOG_PANEL_LINES};
use walrus_dashboard::source::{Endpoints, HttpTransport, Poller, RefreshScheduler};
use walrus_dashboard::{events, ui, App, DashboardState};

#[derive(Parser, Debug)]
#[command(name = "walrus-dashboard")]
#[command(about = "Terminal dashboard for a Walrus storage node")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prometheus metrics endpoint [default: http://127.0.0.1:9184/metrics]
    #[arg(short, long)]
    metrics_url: Option<String>,

    /// Base URL of the node REST API [default: http://127.0.0.1:9185]
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Metrics refresh interval (e.g., "2", "2s", "500ms") [default: 2s]
    #[arg(long)]
    metrics_refresh: Option<String>,

    /// Health refresh interval [default: 20s]
    #[arg(long)]
    rpc_refresh: Option<String>,

    /// Frames drawn per second [default: 5]
    #[arg(long)]
    refresh_per_second: Option<f64>,

    /// Number of readings kept per chart [default: 60]
    #[arg(short, long)]
    graph_size: Option<usize>,

    /// Timeout for each request [default: 3s]
    #[arg(long)]
    request_timeout: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Log level (trace, debug, info, warning, error) [default: info]
    #[arg(long)]
    log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            metrics_url: self.metrics_url.clone(),
            rpc_url: self.rpc_url.clone(),
            metrics_refresh: self.metrics_refresh.clone(),
            rpc_refresh: self.rpc_refresh.clone(),
            request_timeout: self.request_timeout.clone(),
            refresh_per_second: self.refresh_per_second,
            graph_size: self.graph_size,
            insecure_tls: self.insecure.then_some(true),
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = DashboardConfig::load(args.config.as_deref(), &args.overrides())?;

    let logs = LogBuffer::new(LOG_PANEL_LINES);
    logging::init(config.log_level, config.log_file.as_deref(), logs.clone())?;

    // Fetch tasks run on the runtime while the main thread draws
    let rt = tokio::runtime::Runtime::new()?;
    let result = {
        let _guard = rt.enter();

        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                flag.store(true, Ordering::SeqCst);
            }
        });

        let transport = HttpTransport::new(config.insecure_tls)
            .context("Failed to build HTTP client")?;
        let state = DashboardState::shared(config.graph_size);
        let poller = Poller::new(
            Arc::new(transport),
            Arc::clone(&state),
            RefreshScheduler::new(config.metrics_refresh, config.rpc_refresh),
            Endpoints::new(&config.metrics_url, &config.rpc_url),
            config.request_timeout,
        );
        let app = App::new(poller, state, logs, ui::Theme::auto_detect());

        info!(
            metrics = %config.metrics_url,
            rpc = %config.rpc_url,
            "starting dashboard"
        );
        if config.insecure_tls {
            warn!("TLS certificate verification is disabled");
        }

        run_tui(app, config.frame_interval(), &interrupted)
    };

    rt.shutdown_timeout(Duration::from_secs(1));
    result
}

/// Run the TUI until the user quits or the process is interrupted.
fn run_tui(mut app: App, frame_interval: Duration, interrupted: &AtomicBool) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app, frame_interval, interrupted);

    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    frame_interval: Duration,
    interrupted: &AtomicBool,
) -> Result<()> {
    while app.running {
        let frame_start = Instant::now();

        app.tick(frame_start);
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle input until the next frame is due
        let deadline = frame_start + frame_interval;
        loop {
            if interrupted.load(Ordering::SeqCst) {
                info!("interrupted");
                app.quit();
            }
            if !app.running {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match events::poll_event(remaining)? {
                Some(Event::Key(key)) => {
                    events::handle_key_event(app, key);
                    // Redraw right away so overlays open without waiting a frame
                    terminal.draw(|frame| ui::render(frame, app))?;
                }
                Some(_) | None => {}
            }
        }
    }

    info!("shutting down");
    Ok(())
}
