//! The `timbre` binary.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use timbre_server::TimbreServer;
use timbre_settings::{TimbreSettings, load_settings, load_settings_from_path};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "timbre", about = "Style-aware conversational exchange server")]
struct Args {
    /// Path to a settings JSON file (default: built-in defaults plus
    /// TIMBRE_* environment overrides).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(settings: &TimbreSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.filter.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => load_settings().context("loading settings")?,
    };
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    init_tracing(&settings);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %settings.server.host,
        port = settings.server.port,
        "starting timbre"
    );

    let metrics = timbre_server::metrics::install_recorder().context("installing metrics")?;
    let server = TimbreServer::from_settings(settings, Some(metrics))?;
    server.serve().await
}
