use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    middleware::centre::is_valid_centre_id,
    models::user::{SessionProfile, SignInRequest},
    routes::internal_error,
    services::{
        attendance::{current_week, AttendanceService},
        centres::CentreService,
        metrics::SIGN_INS_COUNTER,
    },
    AppState,
};

/// POST /auth/sign-in — compare the centre code, then create the user on
/// first sign-in (with the current week initialised) or refresh its profile.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<SessionProfile>, (StatusCode, Json<Value>)> {
    let centre_id = body.centre.trim().to_lowercase();
    let username = body.username.trim();

    if username.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Username is required" }))));
    }
    if !is_valid_centre_id(&centre_id) {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid centre identifier" }))));
    }

    let centre = CentreService::find(&state.db, &centre_id)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "Centre not found" }))))?;

    if centre.code != body.code {
        SIGN_INS_COUNTER.with_label_values(&[&centre_id, "bad_code"]).inc();
        warn!("Rejected sign-in for {username} at {centre_id}: wrong code");
        return Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Wrong centre code" }))));
    }

    let week = current_week(Utc::now().date_naive());
    let diet = body.diet.as_deref().filter(|d| !d.is_empty());
    let name = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let (user, created) =
        AttendanceService::create_if_absent(&state.db, username, &week, diet, &centre_id, name)
            .await
            .map_err(internal_error)?;

    SIGN_INS_COUNTER.with_label_values(&[&centre_id, "ok"]).inc();
    if created {
        info!("New user {} signed in at {}", user.username, centre_id);
    } else {
        info!("User {} signed in at {}", user.username, centre_id);
    }

    Ok(Json(SessionProfile::from(user)))
}
