use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::{
    middleware::session::Session,
    models::{
        attendance::{AttendanceMap, DayStatus, ReplaceAttendanceRequest, SetMealStatusRequest, WeekQuery},
        user::UserRecord,
    },
    routes::internal_error,
    services::{attendance::AttendanceService, metrics::ATTENDANCE_WRITES_COUNTER},
    AppState,
};

fn late_rejected() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Status 'late' cannot be set from check-in" })),
    )
}

/// GET /attendance/me
pub async fn get_me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UserRecord>, (StatusCode, Json<Value>)> {
    AttendanceService::read(&state.db, &session.username)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" }))))
}

/// GET /attendance/week?week_start=YYYY-MM-DD
pub async fn get_week(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<WeekQuery>,
) -> Result<Json<AttendanceMap>, (StatusCode, Json<Value>)> {
    AttendanceService::week(&state.db, &session.username, params.week_start)
        .await
        .map(Json)
        .map_err(internal_error)
}

/// PUT /attendance — overwrite the caller's whole attendance map.
pub async fn replace(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ReplaceAttendanceRequest>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    if !body.meal_attendance.values().all(DayStatus::writable) {
        return Err(late_rejected());
    }

    let found = AttendanceService::replace_attendance(&state.db, &session.username, &body.meal_attendance)
        .await
        .map_err(internal_error)?;
    if !found {
        return Err((StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" }))));
    }

    ATTENDANCE_WRITES_COUNTER
        .with_label_values(&[&session.centre, "replace"])
        .inc();
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /attendance/{date} — set a single meal cell.
pub async fn set_meal(
    State(state): State<AppState>,
    session: Session,
    Path(date): Path<NaiveDate>,
    Json(body): Json<SetMealStatusRequest>,
) -> Result<Json<DayStatus>, (StatusCode, Json<Value>)> {
    if body.status.is_some_and(|s| !s.is_writable()) {
        return Err(late_rejected());
    }

    let day = AttendanceService::set_meal_status(&state.db, &session.username, date, body.meal, body.status)
        .await
        .map_err(internal_error)?;

    ATTENDANCE_WRITES_COUNTER
        .with_label_values(&[&session.centre, "patch"])
        .inc();
    tracing::debug!(
        "{} set {:?} on {} to {:?}",
        session.username,
        body.meal,
        date,
        body.status
    );
    Ok(Json(day))
}

/// GET /users/{username} — admins read any record of their centre.
pub async fn get_user(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Json<UserRecord>, (StatusCode, Json<Value>)> {
    session.require_admin()?;

    match AttendanceService::read(&state.db, &username)
        .await
        .map_err(internal_error)?
    {
        Some(record) if record.centre == session.centre => Ok(Json(record)),
        _ => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" })))),
    }
}
