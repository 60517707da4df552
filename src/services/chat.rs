use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::chat::{ChatMessage, ChatReply, ChatRow};

const CHAT_COLS: &str = "id, centre_id, author_id, author_name, text, created_at";
const REPLY_COLS: &str = "id, chat_id, author_id, author_name, text, created_at";

pub struct ChatService;

impl ChatService {
    /// Admins get the `limit` most recent messages of the centre; everyone
    /// else only their own. Oldest first, replies attached.
    pub async fn list(
        pool: &PgPool,
        centre: &str,
        viewer: &str,
        is_admin: bool,
        limit: i64,
    ) -> anyhow::Result<Vec<ChatMessage>> {
        let rows = if is_admin {
            sqlx::query_as::<_, ChatRow>(&format!(
                "SELECT {CHAT_COLS} FROM (
                     SELECT {CHAT_COLS} FROM chats
                     WHERE centre_id = $1
                     ORDER BY created_at DESC
                     LIMIT $2
                 ) recent
                 ORDER BY created_at ASC"
            ))
            .bind(centre)
            .bind(limit)
            .fetch_all(pool)
            .await?
        } else {
            sqlx::query_as::<_, ChatRow>(&format!(
                "SELECT {CHAT_COLS} FROM chats
                 WHERE centre_id = $1 AND author_id = $2
                 ORDER BY created_at ASC"
            ))
            .bind(centre)
            .bind(viewer)
            .fetch_all(pool)
            .await?
        };

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let replies = sqlx::query_as::<_, ChatReply>(&format!(
            "SELECT {REPLY_COLS} FROM chat_replies
             WHERE chat_id = ANY($1)
             ORDER BY created_at ASC"
        ))
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        Ok(attach_replies(rows, replies))
    }

    pub async fn find(pool: &PgPool, centre: &str, id: Uuid) -> anyhow::Result<Option<ChatRow>> {
        let row = sqlx::query_as::<_, ChatRow>(&format!(
            "SELECT {CHAT_COLS} FROM chats WHERE id = $1 AND centre_id = $2"
        ))
        .bind(id)
        .bind(centre)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn send(
        pool: &PgPool,
        centre: &str,
        author_id: &str,
        author_name: &str,
        text: &str,
    ) -> anyhow::Result<ChatMessage> {
        let row = sqlx::query_as::<_, ChatRow>(&format!(
            "INSERT INTO chats (centre_id, author_id, author_name, text)
             VALUES ($1, $2, $3, $4)
             RETURNING {CHAT_COLS}"
        ))
        .bind(centre)
        .bind(author_id)
        .bind(author_name)
        .bind(text)
        .fetch_one(pool)
        .await?;
        Ok(ChatMessage::from_row(row, Vec::new()))
    }

    /// Append a reply to an existing top-level message.
    pub async fn reply(
        pool: &PgPool,
        chat_id: Uuid,
        author_id: &str,
        author_name: &str,
        text: &str,
    ) -> anyhow::Result<ChatReply> {
        let reply = sqlx::query_as::<_, ChatReply>(&format!(
            "INSERT INTO chat_replies (chat_id, author_id, author_name, text)
             VALUES ($1, $2, $3, $4)
             RETURNING {REPLY_COLS}"
        ))
        .bind(chat_id)
        .bind(author_id)
        .bind(author_name)
        .bind(text)
        .fetch_one(pool)
        .await?;
        Ok(reply)
    }

    /// Delete a message and, by cascade, all of its replies.
    pub async fn delete(pool: &PgPool, centre: &str, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1 AND centre_id = $2")
            .bind(id)
            .bind(centre)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn attach_replies(rows: Vec<ChatRow>, replies: Vec<ChatReply>) -> Vec<ChatMessage> {
    let mut by_chat: HashMap<Uuid, Vec<ChatReply>> = HashMap::new();
    for reply in replies {
        by_chat.entry(reply.chat_id).or_default().push(reply);
    }
    rows.into_iter()
        .map(|row| {
            let thread = by_chat.remove(&row.id).unwrap_or_default();
            ChatMessage::from_row(row, thread)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn row(author: &str) -> ChatRow {
        ChatRow {
            id: Uuid::new_v4(),
            centre_id: "c1".into(),
            author_id: author.into(),
            author_name: author.into(),
            text: "hi".into(),
            created_at: Utc::now(),
        }
    }

    fn reply_to(chat: &ChatRow, text: &str, offset: i64) -> ChatReply {
        ChatReply {
            id: Uuid::new_v4(),
            chat_id: chat.id,
            author_id: "admin".into(),
            author_name: "Admin".into(),
            text: text.into(),
            created_at: Utc::now() + Duration::seconds(offset),
        }
    }

    #[test]
    fn replies_land_on_their_thread_in_order() {
        let a = row("ana");
        let b = row("ben");
        let replies = vec![reply_to(&b, "first", 0), reply_to(&a, "x", 1), reply_to(&b, "second", 2)];
        let msgs = attach_replies(vec![a.clone(), b.clone()], replies);

        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].id, a.id);
        assert_eq!(msgs[0].replies.len(), 1);
        let texts: Vec<&str> = msgs[1].replies.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn orphan_replies_are_dropped() {
        let a = row("ana");
        let gone = row("ghost");
        let msgs = attach_replies(vec![a], vec![reply_to(&gone, "lost", 0)]);
        assert!(msgs[0].replies.is_empty());
    }
}
