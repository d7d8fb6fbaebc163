use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use notify_relay::config::Config;
use notify_relay::server::{AppState, build_app};
use notify_relay::{Aggregator, DeliverySink, Inbox, TelegramSink, logging};

#[derive(Parser)]
#[command(name = "notify-relay", version, about = "Batch log notifications into Telegram digests")]
struct Cli {
    /// Path to the YAML config file (optional)
    #[arg(short, long, default_value = "notify-relay.yaml")]
    config: PathBuf,

    /// Listen address, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    logging::init(cli.verbose);
    if dotenv.is_err() {
        info!("No .env file found, using OS environment variables");
    }

    let mut config = Config::load(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    let merge_interval = config.relay.merge_interval();
    let sink: Arc<dyn DeliverySink> = Arc::new(
        TelegramSink::from_config(config.telegram.sink_config()?)
            .context("building Telegram client")?,
    );

    let (inbox, inbox_rx) = Inbox::new(config.relay.inbox_capacity);
    let aggregator = Aggregator::new(inbox_rx, sink.clone(), merge_interval).spawn();

    let app = build_app(AppState { inbox, sink }, config.server.request_timeout_seconds);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        %addr,
        ?merge_interval,
        inbox_capacity = config.relay.inbox_capacity,
        api_url = %config.telegram.api_url,
        "Starting server"
    );

    // Serving consumes the router; once it returns the last Inbox handle is gone
    // and the aggregator flushes its open window.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    match tokio::time::timeout(grace, aggregator).await {
        Ok(_) => info!("Shutdown complete"),
        Err(_) => warn!(?grace, "Aggregator did not finish in time, dropping pending window"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
