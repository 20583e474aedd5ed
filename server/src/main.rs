use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// Error tracing
use anyhow::{Context, Result};

use progress_server::{AppState, reload_on_hangup, run};
use shared::config::{load_config, validate_config};
use shared::types::AppConfig;

/// Stream progress updates to clients as Server-Sent Events.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    /// On Unix, SIGHUP re-reads it.
    #[arg(short, long)]
    config: Option<String>,

    /// Address to bind, overriding `[server] bind`.
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overriding `[server] port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Pause between records in milliseconds, overriding `[stream] delay_ms`.
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("Failed to load {}", path))?,
        None => {
            info!("No config file given, using defaults");
            AppConfig::default()
        }
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.stream.delay_ms = delay_ms;
    }
    validate_config(&config).context("Invalid configuration")?;

    let addr = config.server.addr();
    let state = AppState::new(config);

    if let Some(path) = args.config {
        reload_on_hangup(state.clone(), path, args.delay_ms);
    }

    run(&addr, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!("Server closed!");
    Ok(())
}
