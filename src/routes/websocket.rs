use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    middleware::{centre, session},
    models::chat::ChatEvent,
    AppState,
};

/// Browsers cannot set headers on a WebSocket handshake, so identity comes
/// from the query string.
#[derive(Debug, Deserialize)]
pub struct WsQueryParams {
    pub centre: String,
    pub username: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
) -> Response {
    let centre = match centre::resolve(&state, params.centre.to_lowercase()).await {
        Ok(centre::CentreId(c)) => c,
        Err(rejection) => return rejection.into_response(),
    };
    let session = match session::resolve(&state, centre, params.username.trim()).await {
        Ok(s) => s,
        Err(rejection) => return rejection.into_response(),
    };

    ws.on_upgrade(move |socket| async move {
        info!(
            "WebSocket connected: user={} centre={}",
            session.username, session.centre
        );
        let is_admin = session.is_admin();
        handle_socket(socket, state, session.centre, session.username, is_admin).await;
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    centre: String,
    username: String,
    is_admin: bool,
) {
    let (mut sender, mut receiver) = socket.split();

    // Each socket gets its own pub/sub connection
    let channel = ChatEvent::channel(&centre);
    let mut pubsub = match state.redis_client.get_async_pubsub().await {
        Ok(c) => c,
        Err(e) => {
            error!("Redis pubsub error: {}", e);
            return;
        }
    };

    if let Err(e) = pubsub.subscribe(&channel).await {
        error!("Redis subscribe error: {}", e);
        return;
    }

    let viewer = username.clone();
    let mut redis_task = tokio::spawn(async move {
        let mut pubsub_stream = pubsub.on_message();
        while let Some(msg) = pubsub_stream.next().await {
            let payload: String = match msg.get_payload() {
                Ok(p) => p,
                Err(_) => continue,
            };
            let event: ChatEvent = match serde_json::from_str(&payload) {
                Ok(ev) => ev,
                Err(e) => {
                    tracing::warn!("Dropping malformed chat event: {}", e);
                    continue;
                }
            };
            if !event.visible_to(&viewer, is_admin) {
                continue;
            }
            if sender
                .send(Message::Text(payload.into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Clients only listen; anything they send besides close is ignored.
    let mut client_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut redis_task) => client_task.abort(),
        _ = (&mut client_task) => redis_task.abort(),
    }

    info!("WebSocket disconnected: user={} centre={}", username, centre);
}
