use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    middleware::session::Session, models::centre::PushSubscribeRequest, AppState,
};

/// GET /push/public-key — key the browser needs to create a subscription.
pub async fn public_key(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .config
        .push_public_key
        .as_ref()
        .map(|k| Json(json!({ "public_key": k })))
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "Push is not configured" }))))
}

/// POST /push/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<PushSubscribeRequest>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state
        .notifications
        .register_subscription(&state.db, &session.centre, &session.username, &body.subscription)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))))?;

    tracing::info!("Push subscription registered for {}", session.username);
    Ok(StatusCode::NO_CONTENT)
}
