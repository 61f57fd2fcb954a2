//! giftflow-serve - read-only web access to converted output
//!
//! Lists the output tree, serves single files and a zip of everything.

use anyhow::{Context, Result};
use clap::Parser;
use giftflow::serve::{build_router, AppState, DEFAULT_BIND, DEFAULT_OUTPUT_DIR};
use giftflow_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "giftflow-serve", version, about = "Serve the converted output tree over HTTP")]
struct Args {
    /// Output tree to serve
    #[arg(long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Listen address
    #[arg(long, env = "GIFTFLOW_BIND", default_value = DEFAULT_BIND)]
    bind: String,

    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = match init_logging(LogConfig {
        app_name: "giftflow-serve",
        verbose: args.verbose,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: logging unavailable: {:#}", err);
            None
        }
    };

    info!(
        "Starting giftflow-serve v{} for {}",
        env!("CARGO_PKG_VERSION"),
        args.output_dir.display()
    );
    if !args.output_dir.is_dir() {
        warn!(
            "Output directory {} does not exist yet; listings will be empty",
            args.output_dir.display()
        );
    }

    let app = build_router(AppState::new(args.output_dir));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("giftflow-serve listening on http://{}", args.bind);
    info!("Health check: http://{}/health", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("giftflow-serve stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
