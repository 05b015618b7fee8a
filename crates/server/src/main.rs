use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use popcorn_core::{
    create_session_system, load_config, validate_config, Catalog, OmdbClient, PersistentStore,
    Session, SlotStore, SqliteSlotStore,
};
use popcorn_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the session command channel
const SESSION_BUFFER_SIZE: usize = 64;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("popcorn {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("POPCORN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Catalog endpoint: {}", config.catalog.base_url);
    info!("Database path: {:?}", config.storage.path);

    // Watched-list storage
    let slots: Arc<dyn SlotStore> = Arc::new(
        SqliteSlotStore::new(&config.storage.path).context("Failed to open slot store")?,
    );
    info!("Slot store initialized");

    // Remote catalog
    let catalog: Arc<dyn Catalog> = Arc::new(
        OmdbClient::new(config.catalog.clone()).context("Failed to create catalog client")?,
    );

    // Session and its driver task
    let session = Session::from_config(catalog, PersistentStore::new(slots), &config);
    let (session_handle, session_driver) = create_session_system(session, SESSION_BUFFER_SIZE);
    let driver_handle = tokio::spawn(session_driver.run());

    let state = Arc::new(AppState::new(config.clone(), session_handle));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The router (and every SessionHandle clone in AppState) is gone once
    // serve returns, so the driver's command channel closes and it exits
    // after finishing the command in hand.
    info!("Server shutting down...");
    let _ = driver_handle.await;
    info!("Session driver stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
