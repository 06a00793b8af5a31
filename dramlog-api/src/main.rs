//! dramlog-api - whisky tasting log API server
//!
//! Serves the HTTP/JSON API and provides a `create-user` subcommand for
//! provisioning API keys.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dramlog_api::{build_router, AppState};
use dramlog_common::config::{load_toml_config, Config, ConfigOverrides};
use dramlog_common::db::init_database;
use dramlog_common::events::EventBus;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for dramlog-api
#[derive(Parser, Debug)]
#[command(name = "dramlog-api")]
#[command(about = "Whisky tasting log API server")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config location)
    #[arg(short, long, env = "DRAMLOG_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "DRAMLOG_DATABASE")]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "DRAMLOG_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DRAMLOG_PORT")]
    port: Option<u16>,

    /// Log filter (e.g. "info" or "dramlog_api=debug,tower_http=debug")
    #[arg(long, env = "DRAMLOG_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a user and print its API key
    CreateUser {
        username: String,
        /// Grant admin rights (badge and store management)
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;
    let config = Config::resolve(
        toml_config,
        ConfigOverrides {
            database_path: args.database,
            bind: args.bind,
            port: args.port,
            log_level: args.log_level,
        },
    );

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting dramlog-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Database path: {}", config.database_path.display());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    match args.command.unwrap_or(Command::Serve) {
        Command::CreateUser { username, admin } => {
            let mut conn = pool.acquire().await?;
            let (user, api_key) =
                dramlog_api::db::users::create_user(&mut conn, &username, admin)
                    .await
                    .context("Failed to create user")?;
            info!(user_id = user.id, admin = user.admin, "User created");
            println!("{}", api_key);
            Ok(())
        }
        Command::Serve => serve(config, pool).await,
    }
}

async fn serve(config: Config, pool: sqlx::SqlitePool) -> Result<()> {
    let event_bus = EventBus::new(config.event_capacity.max(1));
    let state = AppState::new(pool, event_bus);
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("dramlog-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
