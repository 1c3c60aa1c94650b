use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::message::MessagePayload;

/// Events a connected client may send. Tag values are part of the wire
/// contract shared with the web frontend.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Announce presence for this connection.
    Join { user_id: Uuid },
    /// Mirror of the REST send, used for the immediate fan-out path.
    SendMessage {
        receiver_id: Uuid,
        content: String,
        message_type: Option<String>,
        reply_to: Option<Uuid>,
    },
    /// Ephemeral typing indicator; never persisted.
    Typing {
        sender_id: Uuid,
        receiver_id: Uuid,
        is_typing: bool,
    },
}

/// Events pushed to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Full payload delivered to the recipient of a new message.
    ReceiveMessage { message: MessagePayload },
    /// Lightweight badge-update signal accompanying `ReceiveMessage`, so a
    /// client can bump an unread counter without re-rendering an open chat.
    NewMessageNotification {
        sender_id: Uuid,
        sender_name: String,
        chat_id: String,
    },
    UserTyping { user_id: Uuid, is_typing: bool },
    UserOnline { user_id: Uuid },
    UserOffline { user_id: Uuid },
    /// Reported back to the sending socket only, e.g. a rejected sendMessage.
    Error { message: String },
}
