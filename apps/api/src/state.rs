use std::sync::Arc;

use crate::applications::dispatch::{Scorer, ScoringDispatch};
use crate::applications::uploads::UploadStore;
use crate::auth::token::TokenKeys;
use crate::store::{ApplicationRepository, JobRepository, UserRepository};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub tokens: Arc<TokenKeys>,
    pub uploads: UploadStore,
    /// Runs a single scoring attempt against the engine and persists the outcome.
    pub scorer: Scorer,
    /// Inline scoring inside the request, or a background queue.
    pub dispatch: ScoringDispatch,
}
