use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::{
    middleware::centre::CentreId,
    models::user::{User, UserRole},
    services::attendance::AttendanceService,
    AppState,
};

/// The signed-in user, identified by `X-Centre` + `X-Username`.
///
/// There is no credential check beyond the centre code at sign-in; the
/// username only has to exist and belong to the centre.
#[derive(Debug, Clone)]
pub struct Session {
    pub centre: String,
    pub username: String,
    pub name: String,
    pub role: UserRole,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), (StatusCode, Json<Value>)> {
        if self.is_admin() {
            Ok(())
        } else {
            Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Admins only" }))))
        }
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CentreId(centre) = CentreId::from_request_parts(parts, state).await?;

        let username = parts
            .headers
            .get("X-Username")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or((StatusCode::UNAUTHORIZED, Json(json!({ "error": "Missing X-Username header" }))))?;

        resolve(state, centre, &username).await
    }
}

pub async fn resolve(
    state: &AppState,
    centre: String,
    username: &str,
) -> Result<Session, (StatusCode, Json<Value>)> {
    let user: Option<User> = AttendanceService::find_user(&state.db, username)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Database error" }))))?;

    match user {
        Some(u) if u.centre_id == centre => Ok(Session {
            role: u.role(),
            centre,
            username: u.username,
            name: u.name,
        }),
        _ => Err((StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unknown user for this centre" })))),
    }
}
