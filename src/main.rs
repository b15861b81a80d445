//! Config Gate
//!
//! Admission control in front of a configuration service.
//!
//! ```text
//!                    ┌───────────────────────────────────────────┐
//!                    │                CONFIG GATE                │
//!   Client Request   │  ┌──────────┐   ┌──────────┐   ┌────────┐ │
//!   ─────────────────┼─▶│  origin  │──▶│   peer   │──▶│upstream│─┼──▶ Configuration
//!                    │  │ matcher  │   │  check   │   │forward │ │    service
//!                    │  └──────────┘   └────┬─────┘   └────────┘ │
//!   403 Forbidden    │                      │ non-local           │
//!   ◀────────────────┼──────────────────────┘                     │
//!                    └───────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use config_gate::config::{load_config, LoadedConfig};
use config_gate::http::GateServer;
use config_gate::lifecycle::{signals, Shutdown};
use config_gate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "config-gate")]
#[command(about = "Localhost-only access gate for a configuration service", long_about = None)]
struct Cli {
    /// TOML configuration file. Without it, defaults plus environment apply.
    #[arg(short, long, env = "CONFIG_GATE_CONFIG")]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration, print the effective settings and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let LoadedConfig { config, overridden } = load_config(cli.config.as_deref(), cli.bind)?;

    if cli.check {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init_logging(&config.observability);
    tracing::info!("config-gate v{} starting", env!("CARGO_PKG_VERSION"));
    for key in overridden {
        tracing::info!(key, "Configuration overridden from environment");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GateServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
