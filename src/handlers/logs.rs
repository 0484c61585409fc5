use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::dto::CreateLogResponse;
use crate::error::{AppError, AppResult};
use crate::schema::validate_log_entry;
use crate::AppState;

pub async fn create_log(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<CreateLogResponse>> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let entry = validate_log_entry(&body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected log entry");
        e
    })?;

    let id = state.store.insert(&entry).await?;
    tracing::info!(%id, mood = entry.mood, "Log entry created");

    Ok(Json(id.into()))
}
