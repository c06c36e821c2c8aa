//! GameStash -- game inventory HTTP API server.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

/// Command-line arguments for the GameStash server.
#[derive(Parser, Debug)]
#[command(
    name = "gamestash",
    version,
    about = "Game inventory HTTP API with cloud image uploads"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "gamestash.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = gamestash::config::load_config(&cli.config)?;

    // Initialize tracing / logging. RUST_LOG wins over the config level.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    match config.logging.format.as_str() {
        "json" => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    info!("Loaded configuration from {}", cli.config);

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    // Initialize Prometheus metrics recorder and register metric descriptions.
    if config.observability.metrics {
        gamestash::metrics::init_metrics();
        gamestash::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    // Initialize the game-record store.
    let store: Arc<dyn gamestash::inventory::store::GameStore> =
        match config.store.engine.as_str() {
            "memory" => {
                info!("In-memory game store initialized");
                Arc::new(gamestash::inventory::memory::MemoryGameStore::new())
            }
            "sqlite" | _ => {
                let store_path = &config.store.sqlite.path;
                // Ensure parent directory exists for the SQLite file.
                if let Some(parent) = std::path::Path::new(store_path).parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let store = gamestash::inventory::sqlite::SqliteGameStore::new(store_path)?;
                info!("SQLite game store initialized at {}", store_path);
                Arc::new(store)
            }
        };

    // Initialize the image storage backend based on config.
    let storage: Arc<dyn gamestash::storage::backend::ObjectStorage> =
        match config.storage.backend.as_str() {
            "aws" => {
                let aws_config = config.storage.aws.as_ref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "storage.backend is 'aws' but storage.aws config section is missing"
                    )
                })?;
                let backend = gamestash::storage::aws::AwsGatewayBackend::new(
                    aws_config.bucket.clone(),
                    aws_config.region.clone(),
                    aws_config.prefix.clone(),
                    non_empty(&aws_config.endpoint_url),
                    aws_config.use_path_style,
                    non_empty(&aws_config.access_key_id),
                    non_empty(&aws_config.secret_access_key),
                )
                .await?;
                info!(
                    "AWS gateway storage backend initialized: bucket={} region={} prefix='{}'",
                    aws_config.bucket, aws_config.region, aws_config.prefix
                );
                Arc::new(backend)
            }
            "local" | _ => {
                let local = &config.storage.local;
                let backend = gamestash::storage::local::LocalBackend::new(
                    &local.root_dir,
                    &local.public_base_url,
                )?;
                info!("Local storage backend initialized at {}", local.root_dir);
                Arc::new(backend)
            }
        };

    // Build AppState.
    let state = Arc::new(gamestash::AppState {
        config: config.clone(),
        store,
        storage,
    });

    let app = gamestash::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("GameStash listening on {}", bind_addr);

    // Graceful shutdown: on SIGTERM/SIGINT, stop accepting new connections
    // and wait for in-flight requests to complete.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("GameStash shut down");

    Ok(())
}

/// Treat an empty config string as "not configured".
fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
