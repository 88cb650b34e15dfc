use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tower_sessions::{Expiry, Session};

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::session::USER_KEY;
use crate::domain::access::{Capability, SessionUser, authorize};
use crate::domain::{AccountId, Role};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub id: AccountId,
    pub username: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

// ============================================================================
// Extractors
// ============================================================================

/// Any signed-in account. Rejects with 401 when no valid session is present.
pub struct CurrentUser(pub SessionUser);

/// A signed-in admin. Rejects with 401 without a session and 403 for other roles.
pub struct AdminUser(pub SessionUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts, state).await?;
        let user = authorize(user.as_ref(), Capability::Authenticated)?;
        Ok(Self(user.clone()))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts, state).await?;
        let user = authorize(user.as_ref(), Capability::Admin)?;
        Ok(Self(user.clone()))
    }
}

/// Resolves the session identity, if any, and tags the request span with it.
async fn session_user<S>(parts: &mut Parts, state: &S) -> Result<Option<SessionUser>, ApiError>
where
    S: Send + Sync,
{
    let session = Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| ApiError::internal(msg))?;

    let user = session
        .get::<SessionUser>(USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    if let Some(user) = &user {
        tracing::Span::current().record("user_id", user.username.as_str());
    }

    Ok(user)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password and start a fixed-lifetime session
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    // Username is matched verbatim.
    let user = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    // New id on privilege change so a pre-login cookie cannot be reused.
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let lifetime = time::Duration::hours(state.config().server.session_hours);
    session.set_expiry(Some(Expiry::AtDateTime(OffsetDateTime::now_utc() + lifetime)));

    session
        .insert(USER_KEY, &user)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(LoginResponse {
        id: user.account_id,
        username: user.username,
        role: user.role,
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to end session: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Logged out",
    ))))
}

/// GET /auth/me
pub async fn get_current_user(
    CurrentUser(user): CurrentUser,
) -> Json<ApiResponse<SessionUser>> {
    Json(ApiResponse::success(user))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .change_password(
            user.account_id,
            &payload.current_password,
            &payload.new_password,
            &payload.confirm_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}
