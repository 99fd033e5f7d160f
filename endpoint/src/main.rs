use anyhow::Context;
use axum::{routing::get, Router};
use endpoint::{metrics, rest, Config, Connector, RequestValidator, TemperatureStore};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Starting temperature endpoint");
    info!("HTTP server: {}", config.http_addr);
    info!("Database: {}", config.database_host());
    info!("Connection mode: {:?}", config.connection_mode);

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    info!("Shutting down");
}

async fn run(config: Config) -> anyhow::Result<()> {
    metrics::init_metrics().map_err(|e| anyhow::anyhow!("Failed to register metrics: {}", e))?;

    let connector = Connector::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Invalid CONNECTION_STRING: {}", e))?;
    let store = TemperatureStore::new(connector);
    let validator = RequestValidator::new(config.secret.as_str());

    // Build HTTP app with the reading endpoint and metrics
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(store, validator));

    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.http_addr))?;

    info!("HTTP server listening on {}", config.http_addr);

    let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

    tokio::select! {
        result = server_handle => {
            result.context("HTTP server task panicked")?.context("HTTP server error")?;
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}

async fn metrics_handler() -> endpoint::Result<String> {
    metrics::gather_metrics()
}
