use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kaleido_core::{
    load_config, load_default_config, validate_config, HttpTransport, QueryCache,
    QueryOrchestrator, SourceRegistry,
};

use kaleido_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent to every source. Boorus block anonymous clients.
const USER_AGENT: &str = concat!("kaleido/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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

    // Determine config path
    let config_path = std::env::var("KALEIDO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration; the service runs fine with no config file at all.
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!(
            "No config file at {:?}, using defaults with env overrides",
            config_path
        );
        load_default_config().context("Failed to load default configuration")?
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Log a config fingerprint so deployments are distinguishable.
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded"
    );

    // Source registry and shared HTTP client
    let registry = Arc::new(SourceRegistry::builtin());
    info!(sources = ?registry.names(), "Source registry initialized");

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(16)
        .build()
        .context("Failed to create HTTP client")?;
    let transport = Arc::new(HttpTransport::new(client));

    // Query cache
    let cache = Arc::new(QueryCache::new(config.cache.to_options()));
    info!(
        image_capacity = config.cache.image_capacity,
        tag_capacity = config.cache.tag_capacity,
        "Query cache initialized"
    );

    // Orchestrator (owns the tag resolver and the fetch scheduler)
    let orchestrator = QueryOrchestrator::new(
        registry,
        transport,
        cache,
        config.fetch.to_options(),
        config.resolver.probe_timeout(),
    );
    info!(sweep = ?config.fetch.sweep, "Query orchestrator initialized");

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), orchestrator));
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

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
