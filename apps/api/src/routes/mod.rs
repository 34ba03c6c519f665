pub mod health;


use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::admin::handlers as admin;
use crate::applications::handlers as resumes;
use crate::applications::uploads::MAX_UPLOAD_BYTES;
use crate::auth::handlers as auth;
use crate::auth::middleware::{authenticate, require_admin};
use crate::jobs::handlers as jobs;
use crate::state::AppState;

/// Room for the multipart framing around a maximum-size resume.
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/jobs", get(jobs::handle_list_active))
        .route("/api/jobs/:id", get(jobs::handle_get_job));

    let admin = Router::new()
        .route("/api/auth/pending", get(admin::handle_pending))
        .route("/api/auth/recruiters", get(admin::handle_recruiters))
        .route("/api/auth/candidates", get(admin::handle_candidates))
        .route("/api/auth/stats", get(admin::handle_stats))
        .route("/api/auth/candidate/:id", get(admin::handle_candidate_detail))
        .route("/api/auth/approve/:id", put(admin::handle_approve))
        .route("/api/auth/deactivate/:id", put(admin::handle_deactivate))
        .route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        .route("/api/auth/profile", put(auth::handle_update_profile))
        // Jobs
        .route("/api/jobs", post(jobs::handle_create_job))
        .route("/api/jobs/my-jobs", get(jobs::handle_list_mine))
        .route(
            "/api/jobs/:id",
            put(jobs::handle_update_job).delete(jobs::handle_delete_job),
        )
        // Resumes
        .route("/api/resumes/upload", post(resumes::handle_submit))
        .route(
            "/api/resumes/profile",
            post(resumes::handle_upload_profile).delete(resumes::handle_delete_profile),
        )
        .route("/api/resumes/my-resumes", get(resumes::handle_my_resumes))
        .route("/api/resumes/check/:job_id", get(resumes::handle_check))
        .route("/api/resumes/job/:job_id", get(resumes::handle_list_for_job))
        .route("/api/resumes/:id", get(resumes::handle_get))
        .route("/api/resumes/:id/rescore", post(resumes::handle_rescore))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(public)
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
