use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    middleware::session::Session,
    models::{
        attendance::DayStatus,
        report::{DailySummary, DateQuery, RangeQuery, ReportResult},
    },
    routes::internal_error,
    services::{
        metrics::REPORTS_COUNTER,
        reports::{ReportService, MAX_SUMMARY_DAYS},
    },
    AppState,
};

/// GET /reports/daily?date=YYYY-MM-DD
pub async fn daily(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<DateQuery>,
) -> Result<Json<ReportResult>, (StatusCode, Json<Value>)> {
    session.require_admin()?;

    let report = ReportService::aggregate(&state.db, params.date, &session.centre)
        .await
        .map_err(|e| {
            internal_error(e.context(format!("daily report for {} on {}", session.centre, params.date)))
        })?;

    REPORTS_COUNTER.with_label_values(&[&session.centre, "daily"]).inc();
    Ok(Json(report))
}

/// GET /reports/users?date=YYYY-MM-DD
pub async fn users(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<DateQuery>,
) -> Result<Json<BTreeMap<String, DayStatus>>, (StatusCode, Json<Value>)> {
    session.require_admin()?;

    let table = ReportService::user_attendance_for_date(&state.db, params.date, &session.centre)
        .await
        .map_err(internal_error)?;

    REPORTS_COUNTER.with_label_values(&[&session.centre, "users"]).inc();
    Ok(Json(table))
}

/// GET /reports/summary?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<DailySummary>>, (StatusCode, Json<Value>)> {
    session.require_admin()?;

    let days = (range.to - range.from).num_days();
    if days < 0 {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "'from' must not be after 'to'" }))));
    }
    if days >= MAX_SUMMARY_DAYS {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Range is limited to {MAX_SUMMARY_DAYS} days") })),
        ));
    }

    let summary = ReportService::summary(&state.db, range.from, range.to, &session.centre)
        .await
        .map_err(internal_error)?;

    REPORTS_COUNTER.with_label_values(&[&session.centre, "summary"]).inc();
    Ok(Json(summary))
}
