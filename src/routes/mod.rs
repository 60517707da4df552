pub mod attendance;
pub mod auth;
pub mod birthdays;
pub mod centres;
pub mod chat;
pub mod diets;
pub mod health;
pub mod metrics;
pub mod push;
pub mod reports;
pub mod websocket;

use axum::{
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::AppState;

/// Map a service failure to a 500 with the error message.
pub fn internal_error(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    tracing::error!("request failed: {e:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Sign-in and centre picker
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/centres", get(centres::list_centres))
        .route("/centres/{id}/users", get(centres::list_centre_users))
        // Roster management
        .route("/centre/users", post(centres::create_user))
        .route("/centre/users/import", post(centres::import_users))
        .route("/users/{username}", get(attendance::get_user).put(centres::update_user))
        // Attendance
        .route("/attendance", put(attendance::replace))
        .route("/attendance/me", get(attendance::get_me))
        .route("/attendance/week", get(attendance::get_week))
        .route("/attendance/{date}", patch(attendance::set_meal))
        // Reports
        .route("/reports/daily", get(reports::daily))
        .route("/reports/users", get(reports::users))
        .route("/reports/summary", get(reports::summary))
        .route("/birthdays", get(birthdays::list))
        // Diets
        .route("/diets", get(diets::list))
        .route("/diets/{id}", get(diets::get))
        // Chat
        .route("/chats", get(chat::list).post(chat::send))
        .route("/chats/{id}", delete(chat::delete))
        .route("/ws", get(websocket::ws_handler))
        // Push
        .route("/push/public-key", get(push::public_key))
        .route("/push/subscribe", post(push::subscribe))
}
