use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::errors::AppError;
use crate::extract::Json;
use crate::models::user::{NewUser, Role, RoleKind, User, UserProfile};
use crate::state::AppState;
use crate::store::RepositoryError;

pub const MIN_PASSWORD_LEN: u64 = 6;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<RoleKind>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// User projection plus a bearer token. Pending recruiters get `token: null`.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub token: Option<String>,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Blank strings count as "not supplied".
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Projection plus a fresh token, the shape every credential-changing call returns.
pub(crate) fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse, AppError> {
    let token = if user.role.is_pending() {
        None
    } else {
        Some(state.tokens.issue(user.id)?)
    };
    Ok(AuthResponse {
        user: UserProfile::from(user),
        token,
    })
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    req.name = req.name.trim().to_string();
    req.email = normalize_email(&req.email);
    req.validate()?;

    let kind = req.role.unwrap_or(RoleKind::Candidate);
    if kind == RoleKind::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(req.password).await?;
    let user = state
        .users
        .insert(NewUser {
            name: req.name,
            email: req.email,
            phone: non_blank(req.phone),
            password_hash,
            role: Role::initial(kind),
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict => AppError::Conflict("User already exists".to_string()),
            other => other.into(),
        })?;

    info!(
        "Registered {} {} (approved: {})",
        kind.as_str(),
        user.id,
        user.role.is_approved()
    );

    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(req.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    if user.role.is_pending() {
        return Err(AppError::PendingApproval);
    }

    Ok(Json(auth_response(&state, &user)?))
}

/// PUT /api/auth/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<Arc<User>>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<AuthResponse>, AppError> {
    let mut user = (*current).clone();

    if let Some(name) = non_blank(req.name) {
        user.name = name;
    }
    if let Some(phone) = non_blank(req.phone) {
        user.phone = Some(phone);
    }
    if let Some(email) = non_blank(req.email).map(|e| normalize_email(&e)) {
        if !validator::ValidateEmail::validate_email(&email) {
            return Err(AppError::Validation("a valid email is required".to_string()));
        }
        if let Some(existing) = state.users.find_by_email(&email).await? {
            if existing.id != user.id {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }
        user.email = email;
    }
    if let Some(password) = req.password.filter(|p| !p.is_empty()) {
        if (password.chars().count() as u64) < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        user.password_hash = hash_password(password).await?;
    }

    let updated = state.users.update_profile(&user).await.map_err(|e| match e {
        RepositoryError::Conflict => AppError::Conflict("Email already in use".to_string()),
        other => other.into(),
    })?;

    Ok(Json(auth_response(&state, &updated)?))
}
