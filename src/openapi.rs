/// OpenAPI documentation for the chat service
use utoipa::OpenApi;

use crate::middleware::error_handling::ErrorBody;
use crate::models::message::{MessagePayload, MessageType, Pagination, ReplyPreview};
use crate::models::user::{OtherUser, UserSummary};
use crate::routes::chat::{
    ChatMessagesResponse, ChatsResponse, MarkReadResponse, SendMessageRequest, SendMessageResponse,
    StatusResponse, UnreadCountResponse,
};
use crate::services::conversation_service::ChatSummary;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chat Service API",
        version = "1.0.0",
        description = "Direct messaging, presence and live delivery",
        license(name = "MIT")
    ),
    tags(
        (name = "Health", description = "Service health checks"),
        (name = "Chat", description = "Messages, conversations and read state"),
        (name = "WebSocket", description = "Live channel: join, sendMessage, typing / receiveMessage, newMessageNotification, userTyping, userOnline, userOffline"),
    ),
    components(schemas(
        SendMessageRequest,
        SendMessageResponse,
        ChatMessagesResponse,
        ChatsResponse,
        MarkReadResponse,
        StatusResponse,
        UnreadCountResponse,
        MessagePayload,
        MessageType,
        ReplyPreview,
        Pagination,
        ChatSummary,
        UserSummary,
        OtherUser,
        ErrorBody,
    ))
)]
pub struct ApiDoc;
