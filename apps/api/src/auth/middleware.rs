use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::warn;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the bearer token to a live user and attaches it as `Extension<Arc<User>>`.
///
/// The user is re-read on every request, so an admin deactivating a recruiter
/// takes effect immediately.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;
    let claims = state.tokens.verify(token)?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authorized, user not found".to_string()))?;

    if user.role.is_pending() {
        warn!("Recruiter {} rejected: approval pending", user.id);
        return Err(AppError::PendingApproval);
    }

    request.extensions_mut().insert(Arc::new(user));
    Ok(next.run(request).await)
}

/// Must run inside `authenticate`.
pub async fn require_admin(
    Extension(user): Extension<Arc<User>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden("Not authorized as an admin".to_string()));
    }
    Ok(next.run(request).await)
}
