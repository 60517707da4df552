use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::{
    middleware::session::Session,
    models::birthday::BirthdayEntry,
    routes::internal_error,
    services::birthdays::BirthdayService,
    AppState,
};

/// GET /birthdays — everyone in the caller's centre, calendar order.
pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<BirthdayEntry>>, (StatusCode, Json<Value>)> {
    BirthdayService::birthdays_for_centre(&state.db, &session.centre)
        .await
        .map(Json)
        .map_err(internal_error)
}
