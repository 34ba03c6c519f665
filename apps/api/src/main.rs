mod admin;
mod applications;
mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod jobs;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applications::dispatch::{Scorer, ScoringDispatch, ScoringQueue};
use crate::applications::scoring::HttpScoringEngine;
use crate::applications::uploads::UploadStore;
use crate::auth::token::TokenKeys;
use crate::config::{Config, ScoringMode};
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::{PgApplicationRepository, PgJobRepository, PgUserRepository};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentRank API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let users = Arc::new(PgUserRepository::new(db.clone()));
    let jobs = Arc::new(PgJobRepository::new(db.clone()));
    let applications = Arc::new(PgApplicationRepository::new(db));

    if let Some(seed) = &config.admin_seed {
        auth::seed_admin(users.as_ref(), seed).await?;
    }

    let uploads = UploadStore::new(&config.upload_dir)?;
    info!("Storing uploads in {}", uploads.root().display());

    let engine = HttpScoringEngine::new(&config.scoring_engine_url, config.scoring_timeout)?;
    info!(
        "Scoring engine at {} (timeout {:?}, mode {:?})",
        engine.endpoint(),
        config.scoring_timeout,
        config.scoring_mode
    );

    let scorer = Scorer::new(
        applications.clone(),
        jobs.clone(),
        Arc::new(engine),
        uploads.clone(),
        config.scoring_timeout,
        config.scoring_max_attempts,
    );

    let dispatch = match config.scoring_mode {
        ScoringMode::Inline => ScoringDispatch::Inline,
        ScoringMode::Queued => {
            let (queue, _worker) = ScoringQueue::start(scorer.clone());
            let redrive = queue.clone();
            let pending = applications.clone();
            tokio::spawn(async move {
                if let Err(e) = redrive.requeue_pending(pending.as_ref()).await {
                    error!("Re-queueing pending applications failed: {e}");
                }
            });
            ScoringDispatch::Queued(queue)
        }
    };

    // Build app state
    let state = AppState {
        users,
        jobs,
        applications,
        tokens: Arc::new(TokenKeys::new(config.jwt_secret.as_bytes())),
        uploads,
        scorer,
        dispatch,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
