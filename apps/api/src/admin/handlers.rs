use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::admin::stats::{compute_stats, Stats};
use crate::applications::views::{project_all, ApplicationView, Viewer};
use crate::errors::AppError;
use crate::models::user::{Approval, Role, RoleKind, User, UserProfile};
use crate::state::AppState;
use crate::store::UserFilter;

#[derive(Debug, Serialize)]
pub struct CandidateDetail {
    pub user: UserProfile,
    pub applications: Vec<ApplicationView>,
}

async fn list_profiles(
    state: &AppState,
    filter: UserFilter,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let users = state.users.list(filter).await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

async fn load_recruiter(state: &AppState, id: Uuid) -> Result<User, AppError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if user.role.kind() != RoleKind::Recruiter {
        return Err(AppError::Validation("User is not a recruiter".to_string()));
    }
    Ok(user)
}

async fn set_approval(state: &AppState, id: Uuid, approval: Approval) -> Result<User, AppError> {
    let user = load_recruiter(state, id).await?;
    state
        .users
        .set_role(user.id, Role::Recruiter(approval))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// GET /api/auth/pending
pub async fn handle_pending(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    list_profiles(&state, UserFilter::PendingRecruiters).await
}

/// GET /api/auth/recruiters
pub async fn handle_recruiters(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    list_profiles(&state, UserFilter::Recruiters).await
}

/// GET /api/auth/candidates
pub async fn handle_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    list_profiles(&state, UserFilter::Candidates).await
}

/// PUT /api/auth/approve/:id
pub async fn handle_approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let user = set_approval(&state, id, Approval::Approved).await?;
    info!("Recruiter {} approved", user.id);
    Ok(Json(json!({ "message": "Recruiter approved successfully" })))
}

/// PUT /api/auth/deactivate/:id
pub async fn handle_deactivate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let user = set_approval(&state, id, Approval::Pending).await?;
    info!("Recruiter {} deactivated", user.id);
    Ok(Json(json!({ "message": "Recruiter deactivated successfully" })))
}

/// GET /api/auth/candidate/:id
pub async fn handle_candidate_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateDetail>, AppError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .filter(|u| u.role == Role::Candidate)
        .ok_or_else(|| AppError::NotFound("Candidate not found".to_string()))?;

    let applications = state.applications.list_for_user(user.id).await?;
    let applications = project_all(state.jobs.as_ref(), applications, Viewer::Reviewer).await?;

    Ok(Json(CandidateDetail {
        user: UserProfile::from(&user),
        applications,
    }))
}

/// GET /api/auth/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<Stats>, AppError> {
    let stats = compute_stats(
        state.users.as_ref(),
        state.jobs.as_ref(),
        state.applications.as_ref(),
    )
    .await?;
    Ok(Json(stats))
}
