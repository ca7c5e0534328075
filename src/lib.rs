pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

pub use config::Config;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve" | "-s" | "--serve") => serve(config).await,

        Some("init" | "--init") => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {}", other);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Aula - education platform API");
    println!();
    println!("USAGE:");
    println!("  aula <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("  serve             Run the HTTP server (default)");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the server, database, and JWT settings.");
    println!("  Secrets can be supplied via AULA_JWT_SECRET and AULA_CLIENT_ID.");
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Aula v{} starting...", env!("CARGO_PKG_VERSION"));

    if !config.server.enabled {
        anyhow::bail!("Server is disabled in config");
    }

    let port = config.server.port;
    let shared = Arc::new(SharedState::new(config).await?);
    let state = api::create_app_state(shared).await?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
