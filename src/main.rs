//! AirWatch Bridge - real-time air-quality telemetry bridge
//!
//! Polls an upstream air-quality engine over REST and re-publishes enriched
//! snapshots to SSE subscribers; falls back to a synthetic city feed when the
//! engine is unreachable.
//!
//! # Usage
//!
//! ```bash
//! # Run against a local engine with the default config
//! cargo run --release
//!
//! # Point at a remote engine and poll faster
//! cargo run --release -- --upstream http://engine:5000 --poll-interval 2
//!
//! # Deterministic synthetic feed (for demos and debugging)
//! cargo run --release -- --seed 42
//! ```
//!
//! # Environment Variables
//!
//! - `AIRWATCH_CONFIG`: Path to a TOML config file
//! - `AIRWATCH_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use airwatch_bridge::api::{create_app, BridgeHandle};
use airwatch_bridge::config::BridgeConfig;
use airwatch_bridge::hub::BroadcastHub;
use airwatch_bridge::pipeline::{BridgeState, PipelineDriver};
use airwatch_bridge::simulator::SyntheticFeed;
use airwatch_bridge::upstream::UpstreamClient;
use airwatch_bridge::zones;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "airwatch-bridge")]
#[command(about = "AirWatch air-quality telemetry bridge")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the upstream engine base URL
    #[arg(long, value_name = "URL")]
    upstream: Option<String>,

    /// Override the poll interval in seconds
    #[arg(long, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Seed the synthetic feed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Path to a TOML config file (overrides AIRWATCH_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// Task Supervision
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskName {
    HttpServer,
    PollDriver,
    Heartbeat,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::PollDriver => write!(f, "PollDriver"),
            TaskName::Heartbeat => write!(f, "Heartbeat"),
        }
    }
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Give remaining tasks a moment to observe the cancellation.
    while task_set.join_next().await.is_some() {}

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Load configuration, then apply CLI overrides on top.
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => BridgeConfig::load(),
    };
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(url) = args.upstream {
        config.upstream.base_url = url;
    }
    if let Some(secs) = args.poll_interval {
        config.upstream.poll_interval_secs = secs.max(1);
    }

    info!("════════════════════════════════════════════════════════════");
    info!("  AirWatch Bridge - Air Quality Telemetry");
    info!("════════════════════════════════════════════════════════════");
    info!("Upstream engine: {}", config.upstream.base_url);
    info!(
        "Poll interval: {}s | Window: {} samples | Thresholds: {}",
        config.upstream.poll_interval_secs,
        config.analytics.window_size,
        config.thresholds.len()
    );

    // Shared state and fan-out hub
    let state = Arc::new(RwLock::new(BridgeState::new(config.stream.log_capacity)));
    let hub = Arc::new(BroadcastHub::new(config.stream.subscriber_buffer));

    // Upstream client and synthetic fallback feed
    let upstream = UpstreamClient::new(&config.upstream).context("building upstream client")?;
    let feed = match args.seed {
        Some(seed) => {
            info!("Synthetic feed seeded with {}", seed);
            SyntheticFeed::seeded(config.simulation.clone(), zones::registry(), seed)
        }
        None => SyntheticFeed::new(config.simulation.clone(), zones::registry()),
    };

    let driver = PipelineDriver::new(
        &config,
        upstream,
        feed,
        Arc::clone(&state),
        Arc::clone(&hub),
    );

    // API handlers share the state, hub and a dedicated status client.
    let status_client =
        UpstreamClient::new(&config.upstream).context("building status client")?;
    let handle = BridgeHandle {
        state: Arc::clone(&state),
        hub: Arc::clone(&hub),
        upstream: Arc::new(status_client),
        log_replay: config.stream.log_replay,
    };
    let app = create_app(handle);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("binding to {}", config.server.addr))?;
    info!("Listening on http://{}", config.server.addr);
    info!("SSE stream at /api/stream/live");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());

    let driver_cancel = cancel_token.clone();
    task_set.spawn(async move {
        info!("[PollDriver] Task starting");
        driver.run(driver_cancel).await;
        Ok(TaskName::PollDriver)
    });

    let heartbeat_hub = Arc::clone(&hub);
    let heartbeat_cancel = cancel_token.clone();
    let heartbeat_interval = Duration::from_secs(config.stream.heartbeat_secs.max(1));
    task_set.spawn(async move {
        info!("[Heartbeat] Task starting");
        heartbeat_hub
            .run_heartbeat(heartbeat_interval, heartbeat_cancel)
            .await;
        Ok(TaskName::Heartbeat)
    });

    run_supervisor(&mut task_set, cancel_token).await
}
