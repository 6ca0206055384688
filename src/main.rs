//! Tableau workbook relay.
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!   Browser            │                    RELAY                     │
//!   ───────────────────┼─▶ http (CORS, request ID, limits, timeout)   │
//!                      │        │                                     │
//!                      │        ▼                                     │
//!                      │   api::projects ──┐                          │
//!                      │   api::download ──┼─▶ tableau client ────────┼──▶ Tableau REST API
//!                      │        │          │                          │
//!                      │        ▼          │                          │
//!                      │   archive (bounded fetch, zip)               │
//!                      │   api::generate ────▶ generation client ─────┼──▶ text-generation API
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tableau_relay::lifecycle::{signals, startup, Shutdown};
use tableau_relay::observability::logging;
use tableau_relay::HttpServer;

#[derive(Parser)]
#[command(name = "tableau-relay")]
#[command(about = "Relay between a browser client and the Tableau REST API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = startup::resolve_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("tableau-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_concurrent_downloads = config.downloads.max_concurrent,
        download_timeout_secs = config.downloads.item_timeout_secs,
        "Configuration loaded"
    );

    startup::start_metrics(&config);

    let listener = startup::bind(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config).map_err(startup::StartupError::from)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
