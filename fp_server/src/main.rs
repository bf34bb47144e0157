//! Party game server using an async actor model.
//!
//! A single GameServer actor owns all rooms and sessions; WebSocket
//! handlers forward client events into its inbox and stream its
//! broadcasts back out.

mod api;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Error;
use ctrlc::set_handler;
use forfeit_party::{ContentLibrary, server::GameServer};
use log::info;
use pico_args::Arguments;

use config::ServerConfig;

const HELP: &str = "\
Run a party game server

USAGE:
  fp_server [OPTIONS]

OPTIONS:
  --bind         IP:PORT  Server socket bind address      [default: env SERVER_BIND or 127.0.0.1:6969]
  --content-dir  PATH     Card/question content directory [default: env CONTENT_DIR or content]

FLAGS:
  -h, --help              Print help information

ENVIRONMENT:
  SERVER_BIND             Server bind address (e.g., 0.0.0.0:8080)
  CONTENT_DIR             Directory with the SFW*/NSFW* card and question files
  RUST_LOG                Log level filter (e.g., info, debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let content_dir_override: Option<PathBuf> = pargs.opt_value_from_str("--content-dir")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(bind_override, content_dir_override)?;
    config.validate()?;

    info!(
        "Loading card and question content from {}",
        config.content_dir.display()
    );
    let content = ContentLibrary::load(&config.content_dir)
        .map_err(|e| anyhow::anyhow!("Failed to load content: {e}"))?;

    let (server, handle) = GameServer::new(content);
    tokio::spawn(server.run());

    let app = api::create_router(api::AppState { server: handle });

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {e}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
