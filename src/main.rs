use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feedgate::config::{FeedgateConfig, LogFormat, LoggingConfig};
use feedgate::http::HttpServer;
use feedgate::ratelimit::{RateLimiter, ResetLoop};
use feedgate::updates::FileUpdateSource;

/// Command line options. Flags override the configuration file and environment.
#[derive(Debug, Parser)]
#[command(name = "feedgate", version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Requests a single client may make per window
    #[arg(long)]
    per_client_limit: Option<u64>,

    /// Requests admitted across all clients per window
    #[arg(long)]
    global_limit: Option<u64>,

    /// Window length in seconds
    #[arg(long)]
    window_secs: Option<u64>,

    /// Path to the JSON file holding the update list
    #[arg(long)]
    updates_path: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut FeedgateConfig) {
        if let Some(listen) = self.listen {
            config.server.http_addr = listen;
        }
        if let Some(limit) = self.per_client_limit {
            config.rate_limiting.per_client_limit = limit;
        }
        if let Some(limit) = self.global_limit {
            config.rate_limiting.global_limit = limit;
        }
        if let Some(secs) = self.window_secs {
            config.rate_limiting.window_secs = secs;
        }
        if let Some(path) = self.updates_path {
            config.updates.path = path;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = FeedgateConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    init_tracing(&config.logging);

    info!("Starting Feedgate update feed");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let limits = config.rate_limiting.limits();
    info!(
        http_addr = %config.server.http_addr,
        per_client_limit = limits.per_client,
        global_limit = limits.global,
        window_secs = limits.window.as_secs(),
        "Configuration loaded"
    );

    // Initialize the rate limiter and start its window resets
    let rate_limiter = Arc::new(RateLimiter::new(limits));
    let reset_handle = ResetLoop::spawn(rate_limiter.clone());

    let source = Arc::new(FileUpdateSource::new(&config.updates.path));
    info!(path = %source.path().display(), "Serving updates from file");

    let server = HttpServer::new(config.server.http_addr, rate_limiter, source);
    let served = server.serve_with_shutdown(shutdown_signal()).await;

    reset_handle.shutdown().await;
    served?;

    info!("Feedgate stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
