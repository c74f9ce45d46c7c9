//! LearnTn Server Binary
//!
//! Runs the identity & progression HTTP service.

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use learntn_server::{
    create_router, AppState, LeadSentenceSummarizer, LearningStore, MemoryCatalog, MemoryStore,
    ServerConfig,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    for var in &config.generated_secrets {
        warn!(var = %var, "Secret not set; using a random value, tokens will not survive a restart");
    }

    let catalog = match &config.catalog_path {
        Some(path) => MemoryCatalog::from_file(path)?,
        None => {
            warn!("LEARNTN_CATALOG_PATH not set; starting with an empty catalog");
            MemoryCatalog::new()
        }
    };

    let store = open_store(&config).await?;

    info!(
        port = config.port,
        leaderboard_limit = config.leaderboard_limit,
        access_ttl_secs = config.tokens.access_ttl.num_seconds(),
        refresh_ttl_secs = config.tokens.refresh_ttl.num_seconds(),
        "Starting LearnTn server"
    );

    let state = Arc::new(AppState::new(
        store,
        Arc::new(catalog),
        Arc::new(LeadSentenceSummarizer::default()),
        config.tokens.clone(),
        config.leaderboard_limit,
    ));

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "LearnTn listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn open_store(config: &ServerConfig) -> Result<Arc<dyn LearningStore>, Box<dyn std::error::Error>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(learntn_server::storage::PostgresStore::new(url).await?)),
        None => Ok(Arc::new(MemoryStore::new())),
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(config: &ServerConfig) -> Result<Arc<dyn LearningStore>, Box<dyn std::error::Error>> {
    if config.database_url.is_some() {
        warn!("LEARNTN_DATABASE_URL is set but this build has no postgres feature; using memory store");
    }
    Ok(Arc::new(MemoryStore::new()))
}
