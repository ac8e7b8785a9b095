use advisory_query_api::{
    api::{build_router, AppState},
    config::Config,
    store::{DocumentStore, SchemaValidator},
};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "advisory-query-api")]
#[command(about = "Role-gated query API over security-advisory documents", long_about = None)]
struct Cli {
    /// File name of the configuration file
    #[arg(short, long, value_name = "CFG-FILE")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting advisory-query-api v{}", env!("CARGO_PKG_VERSION"));

    // Build the advisory snapshot. Any load error is fatal: the service
    // must not start with an unreadable tree or an unclassifiable
    // document.
    tracing::info!(
        path = %config.documents.path.display(),
        "Loading advisory documents"
    );
    let store = DocumentStore::open(config.documents.path.clone(), Arc::new(SchemaValidator))
        .map_err(|e| anyhow::anyhow!("failed to build advisory snapshot: {e}"))?;
    tracing::info!(documents = store.snapshot().len(), "✅ Advisory snapshot loaded");

    if config.auth.is_empty() {
        tracing::warn!("⚠️  No credentials configured; only WHITE documents are reachable");
    } else {
        tracing::info!(credentials = config.auth.len(), "✅ Credentials loaded");
    }

    // Create application state and build the router
    let app_state = AppState::new(Arc::new(store), config.auth.clone());
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
