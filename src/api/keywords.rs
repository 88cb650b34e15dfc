use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_record_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::models::keyword::KeywordRecord;
use crate::services::KeywordRecordInput;

/// GET /keywords
pub async fn list_keywords(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<KeywordRecord>>>, ApiError> {
    let records = state.keyword_service().list().await?;
    Ok(Json(ApiResponse::success(records)))
}

/// GET /keywords/{id}
pub async fn get_keyword(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<KeywordRecord>>, ApiError> {
    let id = validate_record_id(id)?;
    let record = state.keyword_service().get(id).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// POST /keywords
pub async fn create_keyword(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(payload): Json<KeywordRecordInput>,
) -> Result<Json<ApiResponse<KeywordRecord>>, ApiError> {
    let record = state.keyword_service().create(payload).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// PUT /keywords/{id}
pub async fn update_keyword(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<KeywordRecordInput>,
) -> Result<Json<ApiResponse<KeywordRecord>>, ApiError> {
    let id = validate_record_id(id)?;
    let record = state.keyword_service().update(id, payload).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// DELETE /keywords/{id}
pub async fn delete_keyword(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_record_id(id)?;
    state.keyword_service().delete(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Keyword record deleted",
    ))))
}
