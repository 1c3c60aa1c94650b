use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::chat_id::chat_id_for;
use crate::error::{AppError, AppResult};
use crate::models::message::{
    MessagePayload, MessageType, Pagination, ReplyPreview, MAX_CONTENT_CHARS,
};
use crate::models::user::UserSummary;
use crate::services::friend_service::FriendService;
use crate::services::user_service::UserService;

const MAX_PAGE_SIZE: i64 = 200;

/// Columns shared by every query that shapes a full message payload.
pub(crate) const PAYLOAD_COLUMNS: &str = "m.id, m.content, m.message_type, m.chat_id, m.is_read, m.read_at, \
     m.created_at, \
     m.sender_id, su.username AS sender_username, su.profile_picture AS sender_picture, \
     m.receiver_id, ru.username AS receiver_username, ru.profile_picture AS receiver_picture, \
     r.id AS reply_id, r.content AS reply_content, r.sender_id AS reply_sender_id";

pub struct MessageService;

impl MessageService {
    pub fn parse_message_type(raw: Option<&str>) -> AppResult<MessageType> {
        match raw {
            None => Ok(MessageType::default()),
            Some(value) => MessageType::parse(value).ok_or_else(|| {
                AppError::BadRequest(format!("unrecognized message type: {value}"))
            }),
        }
    }

    /// Full send path shared by the REST handler and the live channel:
    /// receiver existence, friendship eligibility, then the durable append.
    /// Live delivery is NOT part of this path; the caller hands the returned
    /// payload to the router and ignores the outcome.
    pub async fn send_checked(
        db: &Pool<Postgres>,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
        message_type: MessageType,
        reply_to: Option<Uuid>,
    ) -> AppResult<MessagePayload> {
        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "you cannot send a message to yourself".into(),
            ));
        }
        if UserService::get_summary(db, receiver_id).await?.is_none() {
            return Err(AppError::NotFound("receiver not found".into()));
        }
        if !FriendService::are_friends(db, sender_id, receiver_id).await? {
            return Err(AppError::Forbidden(
                "you can only send messages to your friends".into(),
            ));
        }
        Self::append(db, sender_id, receiver_id, content, message_type, reply_to).await
    }

    /// Validate and persist a message. The store stamps the conversation key,
    /// the id and the creation timestamp; the sender's clock never matters.
    pub async fn append(
        db: &Pool<Postgres>,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
        message_type: MessageType,
        reply_to: Option<Uuid>,
    ) -> AppResult<MessagePayload> {
        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "you cannot send a message to yourself".into(),
            ));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest("message content is required".into()));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::BadRequest(format!(
                "message content exceeds {MAX_CONTENT_CHARS} characters"
            )));
        }

        let sender = UserService::get_summary(db, sender_id)
            .await?
            .ok_or_else(|| AppError::NotFound("sender not found".into()))?;
        let receiver = UserService::get_summary(db, receiver_id)
            .await?
            .ok_or_else(|| AppError::NotFound("receiver not found".into()))?;

        let chat_id = chat_id_for(sender_id, receiver_id);

        // Policy: a reply must resolve to a message in this conversation at
        // send time. Dangling references can still appear later, when the
        // target is deleted, and are tolerated on read.
        let reply_preview = match reply_to {
            None => None,
            Some(reply_id) => Some(Self::resolve_reply(db, reply_id, &chat_id).await?),
        };

        let id = Uuid::new_v4();
        let row = sqlx::query(
            "INSERT INTO messages (id, sender_id, receiver_id, content, message_type, chat_id, reply_to) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING created_at",
        )
        .bind(id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .bind(message_type.as_str())
        .bind(&chat_id)
        .bind(reply_to)
        .fetch_one(db)
        .await?;

        Ok(MessagePayload {
            id,
            sender,
            receiver,
            content: content.to_string(),
            message_type,
            chat_id,
            reply_to: reply_preview,
            is_read: false,
            read_at: None,
            created_at: row.get("created_at"),
        })
    }

    async fn resolve_reply(
        db: &Pool<Postgres>,
        reply_id: Uuid,
        chat_id: &str,
    ) -> AppResult<ReplyPreview> {
        let row = sqlx::query("SELECT id, content, sender_id, chat_id FROM messages WHERE id = $1")
            .bind(reply_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("reply target not found".into()))?;

        let target_chat: String = row.get("chat_id");
        if target_chat != chat_id {
            return Err(AppError::NotFound(
                "reply target is not part of this conversation".into(),
            ));
        }
        Ok(ReplyPreview {
            id: row.get("id"),
            content: row.get("content"),
            sender_id: row.get("sender_id"),
        })
    }

    /// One page of a conversation. Fetched newest-first so page 1 is the most
    /// recent slice, but returned oldest-first for rendering.
    pub async fn get_chat_messages(
        db: &Pool<Postgres>,
        chat_id: &str,
        page: i64,
        limit: i64,
    ) -> AppResult<(Vec<MessagePayload>, Pagination)> {
        if page < 1 {
            return Err(AppError::BadRequest("page must be a positive integer".into()));
        }
        if limit < 1 || limit > MAX_PAGE_SIZE {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_one(db)
            .await?;

        let query_sql = format!(
            "SELECT {PAYLOAD_COLUMNS} \
               FROM messages m \
               JOIN users su ON su.id = m.sender_id \
               JOIN users ru ON ru.id = m.receiver_id \
               LEFT JOIN messages r ON r.id = m.reply_to \
              WHERE m.chat_id = $1 \
              ORDER BY m.created_at DESC, m.id DESC \
              LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&query_sql)
            .bind(chat_id)
            .bind(limit)
            .bind((page - 1) * limit)
            .fetch_all(db)
            .await?;

        let mut messages: Vec<MessagePayload> = rows.iter().map(payload_from_row).collect();
        messages.reverse();

        Ok((messages, Pagination::compute(total, page, limit)))
    }

    /// Flip every unread message addressed to `receiver` in this conversation.
    /// Idempotent: the second call in a row modifies nothing. `read_at` is set
    /// in the same statement as `is_read`, so the pair never drifts apart.
    pub async fn mark_read(
        db: &Pool<Postgres>,
        chat_id: &str,
        receiver_id: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE, read_at = NOW() \
              WHERE chat_id = $1 AND receiver_id = $2 AND is_read = FALSE",
        )
        .bind(chat_id)
        .bind(receiver_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Hard delete, sender only. No tombstone; replies pointing at the
    /// deleted message are left dangling.
    pub async fn delete_message(
        db: &Pool<Postgres>,
        message_id: Uuid,
        requester_id: Uuid,
    ) -> AppResult<()> {
        let row = sqlx::query("SELECT sender_id FROM messages WHERE id = $1")
            .bind(message_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("message not found".into()))?;

        let sender_id: Uuid = row.get("sender_id");
        if sender_id != requester_id {
            return Err(AppError::Forbidden(
                "only the sender can delete a message".into(),
            ));
        }

        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message_id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Global unread count across every conversation of a user.
    pub async fn unread_count_for_user(db: &Pool<Postgres>, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }
}

pub(crate) fn payload_from_row(row: &PgRow) -> MessagePayload {
    let reply_id: Option<Uuid> = row.get("reply_id");
    let reply_to = reply_id.map(|id| ReplyPreview {
        id,
        content: row.get("reply_content"),
        sender_id: row.get("reply_sender_id"),
    });
    let message_type: String = row.get("message_type");

    MessagePayload {
        id: row.get("id"),
        sender: UserSummary {
            id: row.get("sender_id"),
            username: row.get("sender_username"),
            profile_picture: row.get("sender_picture"),
        },
        receiver: UserSummary {
            id: row.get("receiver_id"),
            username: row.get("receiver_username"),
            profile_picture: row.get("receiver_picture"),
        },
        content: row.get("content"),
        message_type: MessageType::parse(&message_type).unwrap_or_default(),
        chat_id: row.get("chat_id"),
        reply_to,
        is_read: row.get("is_read"),
        read_at: row.get("read_at"),
        created_at: row.get("created_at"),
    }
}
