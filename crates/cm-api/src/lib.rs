use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    http::Method,
    routing::{get, post},
    Router,
};
use clap::Parser;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use cm_common::cache::{
    FastTierConfig, InMemoryFastTier, PostgresDurableTier, SimilarityCache,
};
use cm_common::db::{
    create_pool_from_url, run_migrations, DbPoolError, DurableCacheConfig, MigrationError, PgPool,
};
use cm_common::matching::{
    BaseWeights, EngineConfig, MatchEngine, PostgresMatchSink,
};
use cm_common::provider::{OpenAiSimilarityProvider, ProviderError};
use cm_common::resolver::{ResolverConfig, SimilarityResolver};

pub mod error;
pub mod handlers;

use handlers::{cache, health, matches};

#[derive(Debug, Clone, Parser)]
#[command(name = "cm-api", about = "HTTP API for the candidate/job match scoring engine")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3002)]
    port: u16,

    /// API key for the external similarity provider
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_api_key: String,

    /// Chat model used for similarity scoring
    #[arg(long, env = "CM_SIMILARITY_MODEL", default_value = "gpt-4o-mini")]
    similarity_model: String,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "CM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database pool: {0}")]
    Pool(#[from] DbPoolError),
    #[error("database migration: {0}")]
    Migration(#[from] MigrationError),
    #[error("similarity provider: {0}")]
    Provider(#[from] ProviderError),
    #[error("server io: {0}")]
    Io(#[from] std::io::Error),
}

pub struct AppState {
    pub pool: PgPool,
    pub engine: Arc<MatchEngine>,
    pub cache: Arc<SimilarityCache>,
}

pub type SharedState = Arc<AppState>;

/// Wire the engine: in-memory fast tier, Postgres durable tier, OpenAI
/// provider, Postgres match sink. One engine per process.
fn build_state(cli: &Cli, pool: PgPool) -> Result<SharedState, StartupError> {
    let cache = Arc::new(SimilarityCache::new(
        Arc::new(InMemoryFastTier::new(FastTierConfig::from_env())),
        Arc::new(PostgresDurableTier::new(
            pool.clone(),
            DurableCacheConfig::from_env(),
        )),
    ));

    let provider = OpenAiSimilarityProvider::new(cli.openai_api_key.clone())?
        .with_model(cli.similarity_model.clone());

    let resolver = Arc::new(SimilarityResolver::new(
        cache.clone(),
        Arc::new(provider),
        ResolverConfig::from_env(),
    ));

    let engine = MatchEngine::new(resolver, BaseWeights::default(), EngineConfig::from_env())
        .with_sink(Arc::new(PostgresMatchSink::new(pool.clone())));

    Ok(Arc::new(AppState {
        pool,
        engine: Arc::new(engine),
        cache,
    }))
}

pub fn build_router(state: SharedState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/api/match", post(matches::run_match))
        .route("/api/matches/{job_id}", get(matches::top_matches))
        .route("/api/matches/{job_id}/{candidate_id}", get(matches::get_match))
        .route("/api/cache/stats", get(cache::stats))
        .route("/api/cache/entries", get(cache::entries))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

pub async fn run() -> Result<(), StartupError> {
    let cli = Cli::parse();

    cm_metrics::init_metrics("CM_METRICS_PORT", 9091);

    let pool = create_pool_from_url(&cli.database_url)?;
    run_migrations(&pool).await?;

    let state = build_state(&cli, pool)?;
    let router = build_router(state, cors_layer(&cli.cors_origins));

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    info!(%addr, "cm-api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received; draining");
}
