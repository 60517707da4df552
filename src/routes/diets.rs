use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{models::centre::DietInfo, routes::internal_error, services::diets::DietService, AppState};

/// GET /diets
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<DietInfo>>, (StatusCode, Json<Value>)> {
    DietService::list(&state.db).await.map(Json).map_err(internal_error)
}

/// GET /diets/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DietInfo>, (StatusCode, Json<Value>)> {
    DietService::get(&state.db, &id)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "Diet not found" }))))
}
