use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::AppState;

/// Centre ids are lowercase ASCII letters, digits and hyphens, 2 to 63
/// characters, not starting or ending with a hyphen.
pub fn is_valid_centre_id(s: &str) -> bool {
    let len = s.len();
    (2..=63).contains(&len)
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// Centre taken from the `X-Centre` header, checked to exist.
#[derive(Debug, Clone)]
pub struct CentreId(pub String);

impl FromRequestParts<AppState> for CentreId {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("X-Centre")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .ok_or((StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing X-Centre header" }))))?;

        resolve(state, id).await
    }
}

/// Validate a centre id from any source (header, query string).
pub async fn resolve(state: &AppState, id: String) -> Result<CentreId, (StatusCode, Json<Value>)> {
    if !is_valid_centre_id(&id) {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid centre identifier" }))));
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM centres WHERE id = $1)")
        .bind(&id)
        .fetch_one(&state.db)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Database error" }))))?;

    if exists {
        Ok(CentreId(id))
    } else {
        Err((StatusCode::NOT_FOUND, Json(json!({ "error": "Centre not found" }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_id_validation() {
        assert!(is_valid_centre_id("north-side"));
        assert!(is_valid_centre_id("c1"));
        assert!(!is_valid_centre_id("c"));
        assert!(!is_valid_centre_id("-c1"));
        assert!(!is_valid_centre_id("c1-"));
        assert!(!is_valid_centre_id("North"));
        assert!(!is_valid_centre_id("c1; DROP TABLE users"));
        assert!(!is_valid_centre_id(&"a".repeat(64)));
    }
}
