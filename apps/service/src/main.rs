use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracer::{Command, Connectivity, Message, TOPIC_CONN, Tracer};
use tracing::{info, warn};

mod config;

use config::Config;

/// Trace network endpoints and report when they go online or offline
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config, created with defaults when missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the refresh rate of the config, in milliseconds
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Print every probe result as a JSON line on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    let cli = Cli::parse();

    let mut config = Config::from_config(cli.config.as_deref()).context("loading config")?;
    if let Some(refresh_ms) = cli.refresh_ms {
        config.tracer.refresh_rate_ms = refresh_ms;
        config.validate().context("applying --refresh-ms")?;
    }
    if cli.print_config {
        print!("{config}");
        return Ok(());
    }

    let tracer = Tracer::with_config(config.tracer_config());
    let json = cli.json;
    let subscription =
        tracer.subscribe(Command::new(TOPIC_CONN, move |m: Message| report(&m, json)))?;

    tracer.run()?;
    for endpoint in &config.endpoints {
        let pinger = endpoint
            .pinger()
            .with_context(|| format!("building pinger for endpoint {}", endpoint.id))?;
        tracer.trace(pinger)?;
    }

    info!(endpoints = config.endpoints.len(), "Tracing endpoints. Press Ctrl+C to exit.");
    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down tracer.");

    subscription.cancel();
    tracer.close();
    Ok(())
}

fn report(m: &Message, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(m)?);
        return Ok(());
    }

    match m.connectivity() {
        Connectivity::Online => {
            info!(id = %m.id, addr = %m.addr, latency_ms = m.latency_ms, "endpoint online")
        }
        Connectivity::Offline => warn!(
            id = %m.id,
            addr = %m.addr,
            error = m.error.as_deref().unwrap_or_default(),
            "endpoint offline"
        ),
    }
    Ok(())
}
