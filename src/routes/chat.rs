use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use redis::AsyncCommands;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    middleware::session::Session,
    models::chat::{ChatEvent, ChatEventKind, ChatMessage, SendChatRequest},
    routes::internal_error,
    services::{chat::ChatService, metrics::CHAT_MESSAGES_COUNTER},
    AppState,
};

/// Publish to Redis for the live feed. Failures only get logged.
async fn publish(state: &AppState, centre: &str, event: ChatEvent) {
    let mut redis = state.redis.clone();
    let payload = serde_json::to_string(&event).unwrap_or_default();
    if let Err(e) = redis
        .publish::<_, _, ()>(ChatEvent::channel(centre), &payload)
        .await
    {
        tracing::warn!("chat publish failed for {centre}: {e}");
    }
}

/// GET /chats
pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ChatMessage>>, (StatusCode, Json<Value>)> {
    ChatService::list(
        &state.db,
        &session.centre,
        &session.username,
        session.is_admin(),
        state.config.chat_history_limit,
    )
    .await
    .map(Json)
    .map_err(internal_error)
}

/// POST /chats — new message, or a reply when `reply_to` is set.
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SendChatRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Message is empty" }))));
    }

    let Some(parent_id) = body.reply_to else {
        let msg = ChatService::send(&state.db, &session.centre, &session.username, &session.name, text)
            .await
            .map_err(internal_error)?;

        CHAT_MESSAGES_COUNTER.with_label_values(&[&session.centre, "message"]).inc();
        let payload = json!(msg);
        publish(
            &state,
            &session.centre,
            ChatEvent {
                kind: ChatEventKind::Created,
                thread_author_id: session.username.clone(),
                payload: payload.clone(),
            },
        )
        .await;
        return Ok((StatusCode::CREATED, Json(payload)));
    };

    let parent = ChatService::find(&state.db, &session.centre, parent_id)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "Message not found" }))))?;

    if !session.is_admin() && parent.author_id != session.username {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Not your conversation" }))));
    }

    let reply = ChatService::reply(&state.db, parent.id, &session.username, &session.name, text)
        .await
        .map_err(internal_error)?;

    CHAT_MESSAGES_COUNTER.with_label_values(&[&session.centre, "reply"]).inc();
    let payload = json!(reply);
    publish(
        &state,
        &session.centre,
        ChatEvent {
            kind: ChatEventKind::Replied,
            thread_author_id: parent.author_id,
            payload: payload.clone(),
        },
    )
    .await;
    Ok((StatusCode::CREATED, Json(payload)))
}

/// DELETE /chats/{id} — removes the message with its whole reply thread.
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let msg = ChatService::find(&state.db, &session.centre, id)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "Message not found" }))))?;

    if !session.is_admin() && msg.author_id != session.username {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Not your message" }))));
    }

    let deleted = ChatService::delete(&state.db, &session.centre, id)
        .await
        .map_err(internal_error)?;

    if deleted {
        tracing::info!("{} deleted chat message {}", session.username, id);
        publish(
            &state,
            &session.centre,
            ChatEvent {
                kind: ChatEventKind::Deleted,
                thread_author_id: msg.author_id,
                payload: json!({ "id": id }),
            },
        )
        .await;
    }
    Ok(StatusCode::NO_CONTENT)
}
