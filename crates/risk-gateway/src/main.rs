//! Credit risk prediction server - Main Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use risk_core::constants::SERVICE_VERSION;
use risk_gateway::config::AppConfig;
use risk_gateway::metrics::MetricsRegistry;
use risk_gateway::server::{serve, AppState};
use risk_model::InferenceService;

/// Credit default risk prediction server
#[derive(Parser, Debug)]
#[command(name = "risk-gateway")]
#[command(version)]
#[command(about = "Serves credit default risk predictions over HTTP", long_about = None)]
struct Args {
    /// Configuration file path (overrides RISK_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = AppConfig::load(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => AppConfig::from_env()?,
    };

    if let Some(port) = args.port {
        config.port = port;
    }
    if args.verbose {
        config.log_level = "debug".to_string();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    tracing::info!(
        name = %config.name,
        version = SERVICE_VERSION,
        debug = config.debug,
        "starting credit risk service"
    );

    let service = match InferenceService::load(&config.artifact_paths()) {
        Ok(service) => Arc::new(service),
        Err(err) => {
            tracing::error!(error = %err, "failed to load model artifacts");
            return Err(err.into());
        }
    };

    let metrics = Arc::new(MetricsRegistry::new());
    let state = Arc::new(AppState::new(service, metrics, &config));

    serve(state, &config.bind_address()).await?;

    tracing::info!("credit risk service stopped");
    Ok(())
}
