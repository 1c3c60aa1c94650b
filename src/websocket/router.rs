use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::models::message::MessagePayload;
use crate::websocket::message_types::ServerEvent;
use crate::websocket::PresenceRegistry;

/// Bridge between persisted message creation and live delivery.
///
/// Every route is best-effort: an offline recipient, a stale handle, or a
/// serialization failure is swallowed, so the send path that triggered the
/// push always reports success based on the persist alone.
#[derive(Clone)]
pub struct MessageRouter {
    presence: PresenceRegistry,
}

impl MessageRouter {
    pub fn new(presence: PresenceRegistry) -> Self {
        Self { presence }
    }

    /// Push a freshly persisted message to its recipient, if connected: the
    /// full payload plus a lightweight notification for unread badges.
    pub fn route_new_message(&self, message: &MessagePayload) {
        let Some(handle) = self.presence.lookup(message.receiver.id) else {
            tracing::debug!(
                receiver = %message.receiver.id,
                chat_id = %message.chat_id,
                "recipient offline, message delivered on next fetch"
            );
            return;
        };

        Self::push(
            &handle,
            &ServerEvent::ReceiveMessage {
                message: message.clone(),
            },
        );
        Self::push(
            &handle,
            &ServerEvent::NewMessageNotification {
                sender_id: message.sender.id,
                sender_name: message.sender.username.clone(),
                chat_id: message.chat_id.clone(),
            },
        );
    }

    /// Relay a typing indicator. Never persisted, never queued: an offline
    /// receiver simply misses it.
    pub fn route_typing(&self, sender_id: Uuid, receiver_id: Uuid, is_typing: bool) {
        if let Some(handle) = self.presence.lookup(receiver_id) {
            Self::push(
                &handle,
                &ServerEvent::UserTyping {
                    user_id: sender_id,
                    is_typing,
                },
            );
        }
    }

    fn push(handle: &UnboundedSender<String>, event: &ServerEvent) {
        if let Ok(text) = serde_json::to_string(event) {
            // A send error means the receiver disconnected between lookup and
            // push; their own teardown cleans the registry.
            let _ = handle.send(text);
        }
    }
}
