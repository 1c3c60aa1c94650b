use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres, Row};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::message::MessagePayload;
use crate::models::user::OtherUser;
use crate::services::message_service::{payload_from_row, PAYLOAD_COLUMNS};

/// One entry of a user's conversation list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub chat_id: String,
    pub other_user: OtherUser,
    pub last_message: MessagePayload,
    pub unread_count: i64,
}

/// Conversations are derived from the message table on every request; there
/// is no second source of truth to drift. `other_user.is_online` is filled in
/// by the caller from the presence registry.
pub struct ConversationService;

impl ConversationService {
    pub async fn list_conversations(
        db: &Pool<Postgres>,
        viewer_id: Uuid,
    ) -> AppResult<Vec<ChatSummary>> {
        // Newest message per conversation the viewer participates in.
        let query_sql = format!(
            "SELECT DISTINCT ON (m.chat_id) {PAYLOAD_COLUMNS} \
               FROM messages m \
               JOIN users su ON su.id = m.sender_id \
               JOIN users ru ON ru.id = m.receiver_id \
               LEFT JOIN messages r ON r.id = m.reply_to \
              WHERE m.sender_id = $1 OR m.receiver_id = $1 \
              ORDER BY m.chat_id, m.created_at DESC, m.id DESC"
        );
        let rows = sqlx::query(&query_sql)
            .bind(viewer_id)
            .fetch_all(db)
            .await?;

        let unread_rows = sqlx::query(
            "SELECT chat_id, COUNT(*) AS unread FROM messages \
              WHERE receiver_id = $1 AND is_read = FALSE \
              GROUP BY chat_id",
        )
        .bind(viewer_id)
        .fetch_all(db)
        .await?;
        let unread_by_chat: HashMap<String, i64> = unread_rows
            .into_iter()
            .map(|r| (r.get("chat_id"), r.get("unread")))
            .collect();

        let mut chats: Vec<ChatSummary> = rows
            .iter()
            .map(|row| {
                let last_message = payload_from_row(row);
                let other = if last_message.sender.id == viewer_id {
                    last_message.receiver.clone()
                } else {
                    last_message.sender.clone()
                };
                ChatSummary {
                    unread_count: unread_by_chat
                        .get(&last_message.chat_id)
                        .copied()
                        .unwrap_or(0),
                    other_user: OtherUser::from_summary(other, false),
                    chat_id: last_message.chat_id.clone(),
                    last_message,
                }
            })
            .collect();

        // Most recently active conversation first.
        chats.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
        Ok(chats)
    }
}
