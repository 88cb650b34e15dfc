//! Account administration. Every route here requires the admin role.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AdminUser;
use super::validation::validate_account_id;
use super::{AccountDto, ApiError, ApiResponse, AppState, MessageResponse};
use crate::models::account::AccountSummary;

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// GET /accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<ApiResponse<Vec<AccountSummary>>>, ApiError> {
    let accounts = state.account_service().list_accounts().await?;
    Ok(Json(ApiResponse::success(accounts)))
}

/// POST /accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let account = state
        .account_service()
        .create_account(&payload.username, &payload.password, &payload.role)
        .await?;

    Ok(Json(ApiResponse::success(account.into())))
}

/// DELETE /accounts/{id}
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_account_id(id)?;
    state.account_service().delete_account(&actor, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Account deleted",
    ))))
}

/// PUT /accounts/{id}/password
/// Also clears any lockout on the account.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<i32>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_account_id(id)?;
    state
        .account_service()
        .reset_password(id, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password reset",
    ))))
}

/// POST /accounts/{id}/unlock
pub async fn unlock_account(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_account_id(id)?;
    state.account_service().unlock_account(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Account unlocked",
    ))))
}
