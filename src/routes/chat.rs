use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::chat_id::chat_id_for;
use crate::error::{AppError, AppResult};
use crate::models::message::{MessagePayload, Pagination};
use crate::services::conversation_service::{ChatSummary, ConversationService};
use crate::services::friend_service::FriendService;
use crate::services::message_service::MessageService;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
    pub message_type: Option<String>,
    pub reply_to: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: String,
    pub data: MessagePayload,
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<SendMessageResponse>)> {
    let message_type = MessageService::parse_message_type(body.message_type.as_deref())?;
    let payload = MessageService::send_checked(
        &state.db,
        user_id,
        body.receiver_id,
        &body.content,
        message_type,
        body.reply_to,
    )
    .await?;

    // Live delivery is best-effort and cannot fail the send.
    state.router.route_new_message(&payload);

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            success: true,
            message: "Message sent successfully!".into(),
            data: payload,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagesResponse {
    pub success: bool,
    pub message: String,
    pub messages: Vec<MessagePayload>,
    pub pagination: Pagination,
}

pub async fn get_chat_messages(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(friend_id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<ChatMessagesResponse>> {
    if !FriendService::are_friends(&state.db, user_id, friend_id).await? {
        return Err(AppError::Forbidden(
            "you can only view messages with your friends".into(),
        ));
    }

    let chat_id = chat_id_for(user_id, friend_id);
    let (messages, pagination) = MessageService::get_chat_messages(
        &state.db,
        &chat_id,
        params.page.unwrap_or(1),
        params.limit.unwrap_or(50),
    )
    .await?;

    // Fetching history marks the conversation read for the caller. The page
    // itself still shows the pre-fetch read state.
    MessageService::mark_read(&state.db, &chat_id, user_id).await?;

    Ok(Json(ChatMessagesResponse {
        success: true,
        message: "Chat messages fetched successfully!".into(),
        messages,
        pagination,
    }))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatsResponse {
    pub success: bool,
    pub message: String,
    pub chats: Vec<ChatSummary>,
}

pub async fn get_all_chats(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> AppResult<Json<ChatsResponse>> {
    let mut chats = ConversationService::list_conversations(&state.db, user_id).await?;
    for chat in &mut chats {
        chat.other_user.is_online = state.presence.is_online(chat.other_user.id);
    }

    Ok(Json(ChatsResponse {
        success: true,
        message: "Chats fetched successfully!".into(),
        chats,
    }))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub success: bool,
    pub message: String,
    pub modified_count: u64,
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(friend_id): Path<Uuid>,
) -> AppResult<Json<MarkReadResponse>> {
    let chat_id = chat_id_for(user_id, friend_id);
    let modified_count = MessageService::mark_read(&state.db, &chat_id, user_id).await?;

    Ok(Json(MarkReadResponse {
        success: true,
        message: "Messages marked as read successfully!".into(),
        modified_count,
    }))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<StatusResponse>> {
    MessageService::delete_message(&state.db, message_id, user_id).await?;

    Ok(Json(StatusResponse {
        success: true,
        message: "Message deleted successfully!".into(),
    }))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub success: bool,
    pub message: String,
    pub unread_count: i64,
}

pub async fn get_unread_count(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> AppResult<Json<UnreadCountResponse>> {
    let unread_count = MessageService::unread_count_for_user(&state.db, user_id).await?;

    Ok(Json(UnreadCountResponse {
        success: true,
        message: "Unread count fetched successfully!".into(),
        unread_count,
    }))
}
