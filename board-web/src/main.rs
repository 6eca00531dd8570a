//! Board Web Server
//!
//! Identity and session layer fronting the message board.

use board_core::{init_logging, BoardConfig};
use board_web::server::BoardServerBuilder;
use board_web::WebConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

/// Board server - name-based sessions with admin-forced refresh
#[derive(Parser)]
#[command(name = "board-server")]
#[command(about = "Identity and session layer for the message board")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Name that becomes admin on registration
    #[arg(long)]
    admin_name: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = match &args.config {
        Some(path) => match BoardConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {}", e);
                std::process::exit(1);
            }
        },
        None => BoardConfig::default(),
    };
    config.apply_env_overrides();

    // Command line arguments win over file and environment
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(admin_name) = args.admin_name {
        config.server.admin_name = admin_name;
    }

    let logging = config.logging.clone().with_level(&args.log_level);
    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = config.validate() {
        e.log();
        std::process::exit(1);
    }

    let server = match BoardServerBuilder::with_config(WebConfig::from(config.server)).build() {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting on http://{}", server.config().address());

    if let Err(e) = server.start().await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
