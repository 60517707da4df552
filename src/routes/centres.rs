use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    middleware::{centre, session::Session},
    models::{
        centre::CentreSummary,
        user::{
            CentreUser, CreateUserRequest, ImportUsersRequest, ImportUsersResponse, UpdateUserRequest,
            UserRole,
        },
    },
    routes::internal_error,
    services::{
        attendance::current_week,
        centres::{prepare_import, CentreService, NewUser, UserPatch},
    },
    AppState,
};

fn invalid_birthday(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
}

/// GET /centres — sign-in picker.
pub async fn list_centres(
    State(state): State<AppState>,
) -> Result<Json<Vec<CentreSummary>>, (StatusCode, Json<Value>)> {
    CentreService::list(&state.db).await.map(Json).map_err(internal_error)
}

/// GET /centres/{id}/users — sign-in picker.
pub async fn list_centre_users(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CentreUser>>, (StatusCode, Json<Value>)> {
    let centre::CentreId(id) = centre::resolve(&state, id.to_lowercase()).await?;
    CentreService::list_users(&state.db, &id)
        .await
        .map(Json)
        .map_err(internal_error)
}

/// POST /centre/users — admin adds one user to their centre.
pub async fn create_user(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CentreUser>), (StatusCode, Json<Value>)> {
    session.require_admin()?;

    let username = body.username.trim().to_string();
    if username.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Username is required" }))));
    }
    let birthday = body
        .birthday
        .as_ref()
        .map(|b| b.normalize())
        .transpose()
        .map_err(invalid_birthday)?;

    let new_user = NewUser {
        name: body
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.clone()),
        role: body.role.unwrap_or(UserRole::Staff),
        diet: body.diet.filter(|d| !d.is_empty()),
        username,
        birthday,
    };

    let week = current_week(Utc::now().date_naive());
    let created = CentreService::create_user(&state.db, &session.centre, &new_user, &week)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::CONFLICT, Json(json!({ "error": "Username already taken" }))))?;

    tracing::info!("{} added user {} to {}", session.username, created.username, session.centre);
    Ok((StatusCode::CREATED, Json(CentreUser::from(created))))
}

/// PUT /users/{username} — per-field profile update.
pub async fn update_user(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<CentreUser>, (StatusCode, Json<Value>)> {
    session.require_admin()?;

    let patch = UserPatch {
        name: body.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        role: body.role,
        // An empty diet label clears it, same as null.
        diet: body.diet.map(|d| d.filter(|d| !d.is_empty())),
        birthday: match body.birthday {
            Some(Some(b)) => Some(Some(b.normalize().map_err(invalid_birthday)?)),
            Some(None) => Some(None),
            None => None,
        },
    };

    CentreService::update_user(&state.db, &session.centre, &username, &patch)
        .await
        .map_err(internal_error)?
        .map(|u| Json(CentreUser::from(u)))
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" }))))
}

/// POST /centre/users/import — bulk roster upsert, lenient about birthdays.
pub async fn import_users(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ImportUsersRequest>,
) -> Result<Json<ImportUsersResponse>, (StatusCode, Json<Value>)> {
    session.require_admin()?;

    let (users, birthdays_dropped) = prepare_import(body.users);
    let week = current_week(Utc::now().date_naive());
    let outcome = CentreService::import_users(&state.db, &session.centre, &users, &week)
        .await
        .map_err(internal_error)?;

    tracing::info!(
        "{} imported {} users into {} ({} birthdays dropped, {} skipped)",
        session.username,
        outcome.imported,
        session.centre,
        birthdays_dropped.len(),
        outcome.skipped.len()
    );
    Ok(Json(ImportUsersResponse {
        imported: outcome.imported,
        birthdays_dropped,
        skipped: outcome.skipped,
    }))
}
