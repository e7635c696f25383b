mod config;

use agentrelay_gateway::{EventRouter, GatewayServer, SweepHandle};
use clap::{Parser, Subcommand};
use config::RelayConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agentrelay", about = "agentrelay: session-scoped agent event gateway")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "agentrelay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = RelayConfig::load(&cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => serve(config.with_overrides(host, port)).await?,
        Commands::CheckConfig => print!("{}", config.to_toml()?),
    }

    Ok(())
}

async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let router = Arc::new(EventRouter::new(config.delivery.clone()));
    let sweeper = SweepHandle::spawn(router.clone(), config.delivery.sweep_interval());
    let app = GatewayServer::build(router);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        max_queue_size = config.delivery.max_queue_size,
        "agentrelay gateway listening"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.stop().await;
    info!("agentrelay gateway stopped");
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
