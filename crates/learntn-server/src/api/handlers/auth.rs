//! Credential handlers: register, login, refresh, logout, profile

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::Utc;
use learntn_auth::{hash_password, verify_missing_account, verify_password, TokenPair, TokenSubject};
use learntn_core::{Identity, IdentitySummary, Operation, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::ApiError;
use crate::api::extract::Authenticated;
use crate::api::state::AppState;
use crate::storage::StorageError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Requested role; only `instructor` (or `teacher`) is honored
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Identity summary plus a freshly issued pair
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: IdentitySummary,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: IdentitySummary,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn required(field: Option<String>, name: &str) -> Result<String, ApiError> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Self-service registration never grants administrator
fn registration_role(requested: Option<&str>) -> Role {
    match requested.and_then(|r| r.parse::<Role>().ok()) {
        Some(Role::Instructor) => Role::Instructor,
        _ => Role::Learner,
    }
}

/// Register a new identity and issue its first pair
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(request) = payload?;

    let name = required(request.name, "name")?;
    let email = normalize_email(&required(request.email, "email")?);
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("password is required".into()))?;

    let name_len = name.chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(ApiError::BadRequest("name must be 2 to 100 characters".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("email is not valid".into()));
    }

    let role = registration_role(request.role.as_deref());
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let identity = state
        .store
        .create_identity(Identity::new(name, email, password_hash, role, Utc::now()))
        .await
        .map_err(|e| match e {
            StorageError::AlreadyExists(_) => {
                ApiError::Conflict("An account with this email already exists".into())
            }
            other => other.into(),
        })?;

    let tokens = state.tokens.issue_pair(&TokenSubject::from(&identity)).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: identity.summary(),
            tokens,
        }),
    ))
}

/// Check credentials and issue a new pair, superseding any previous one
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = payload?;

    let email = normalize_email(&required(request.email, "email")?);
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("password is required".into()))?;

    let Some(identity) = state.store.find_identity_by_email(&email).await? else {
        tokio::task::spawn_blocking(move || verify_missing_account(&password)).await??;
        warn!("Login for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    let stored_hash = identity.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;
    if !matches {
        warn!(identity_id = %identity.id, "Login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let tokens = state.tokens.issue_pair(&TokenSubject::from(&identity)).await?;
    info!(identity_id = %identity.id, "Login successful");

    Ok(Json(AuthResponse {
        user: identity.summary(),
        tokens,
    }))
}

/// Exchange a refresh token for a new pair
///
/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(request) = payload?;
    let presented = required(request.refresh_token, "refreshToken")?;

    Ok(Json(state.tokens.rotate(&presented).await?))
}

/// Clear the caller's refresh slot
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
) -> Result<Json<MessageResponse>, ApiError> {
    let claims = auth.require(&state, Operation::Logout)?;
    state.tokens.revoke(claims.id).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".into(),
    }))
}

/// GET /api/auth/profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
) -> Result<Json<ProfileResponse>, ApiError> {
    let claims = auth.require(&state, Operation::ViewProfile)?;
    let identity = state
        .store
        .get_identity(claims.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ProfileResponse {
        user: identity.summary(),
    }))
}
