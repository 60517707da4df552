use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Top-level chat row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRow {
    pub id: Uuid,
    pub centre_id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatReply {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A message with its reply thread, as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<ChatReply>,
}

impl ChatMessage {
    pub fn from_row(row: ChatRow, replies: Vec<ChatReply>) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            author_name: row.author_name,
            text: row.text,
            created_at: row.created_at,
            replies,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendChatRequest {
    pub text: String,
    /// When set, the text is appended as a reply to this message.
    pub reply_to: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatEventKind {
    Created,
    Replied,
    Deleted,
}

/// Published on `centre:{id}:chats` and forwarded over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub kind: ChatEventKind,
    /// Author of the top-level message the event belongs to.
    pub thread_author_id: String,
    pub payload: serde_json::Value,
}

impl ChatEvent {
    pub fn channel(centre: &str) -> String {
        format!("centre:{centre}:chats")
    }

    /// Admins follow every thread; staff only their own.
    pub fn visible_to(&self, username: &str, is_admin: bool) -> bool {
        is_admin || self.thread_author_id == username
    }
}
