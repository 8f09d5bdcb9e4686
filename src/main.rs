//! HTTP relay.
//!
//! Forwards caller requests to third-party APIs and relays the response.
//!
//! ```text
//!     Caller ──▶ /api/proxy ──┐                           ┌──▶ caller-supplied URL
//!                             ├──▶ relay endpoint ──▶ ────┤
//!     Caller ──▶ fixed route ─┘   (headers, timeout)      └──▶ configured URL
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_relay::config::loader::{apply_port, load_with_env};
use api_relay::lifecycle::{wait_for_termination, Shutdown};
use api_relay::observability::{logging, metrics};
use api_relay::RelayServer;

#[derive(Parser)]
#[command(name = "api-relay")]
#[command(about = "HTTP relay for clients that cannot call third-party APIs directly", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overriding the config file and `PORT`.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_with_env(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        apply_port(&mut config, &port.to_string())?;
    }

    logging::init_logging(&config.observability);

    tracing::info!("api-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        proxy_enabled = config.proxy.enabled,
        fixed_routes = config.fixed_routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = RelayServer::new(config)?;
    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => result??,
        _ = wait_for_termination() => {
            shutdown.trigger();
            server_task.await??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
