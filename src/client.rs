//! Client-side reconciliation between the live channel and paginated
//! history.
//!
//! This state machine runs on the remote peer, not in the request path; it
//! ships with the service so the merge rules native clients must follow are
//! executable and covered by tests. It performs no I/O: callers feed it
//! pushed [`ServerEvent`]s and REST responses.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::message::{MessagePayload, Pagination};
use crate::models::user::OtherUser;
use crate::services::conversation_service::ChatSummary;
use crate::websocket::message_types::ServerEvent;

#[derive(Debug)]
pub struct ChatClient {
    user_id: Uuid,
    pub conversations: Vec<ChatSummary>,
    pub active_chat: Option<String>,
    pub messages: Vec<MessagePayload>,
    pub pagination: Option<Pagination>,
    pub unread_count: i64,
    /// Users currently typing at us. No expiry in the protocol itself; a
    /// non-typing event or a conversation switch clears the flag.
    pub typing: HashSet<Uuid>,
    pub online_users: HashSet<Uuid>,
    /// Badge counts per conversation from newMessageNotification pushes.
    pub notifications: HashMap<String, u32>,
    pub last_error: Option<String>,
}

impl ChatClient {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            conversations: Vec::new(),
            active_chat: None,
            messages: Vec::new(),
            pagination: None,
            unread_count: 0,
            typing: HashSet::new(),
            online_users: HashSet::new(),
            notifications: HashMap::new(),
            last_error: None,
        }
    }

    pub fn open_chat(&mut self, chat_id: &str) {
        self.active_chat = Some(chat_id.to_string());
        self.messages.clear();
        self.pagination = None;
        self.typing.clear();
    }

    pub fn close_chat(&mut self) {
        self.active_chat = None;
        self.messages.clear();
        self.pagination = None;
        self.typing.clear();
    }

    /// Feed one pushed event from the live channel.
    pub fn apply_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::ReceiveMessage { message } => self.receive_message(message),
            ServerEvent::NewMessageNotification { chat_id, .. } => {
                *self.notifications.entry(chat_id).or_insert(0) += 1;
            }
            ServerEvent::UserTyping { user_id, is_typing } => {
                if is_typing {
                    self.typing.insert(user_id);
                } else {
                    self.typing.remove(&user_id);
                }
            }
            ServerEvent::UserOnline { user_id } => {
                self.online_users.insert(user_id);
                self.set_presence(user_id, true);
            }
            ServerEvent::UserOffline { user_id } => {
                self.online_users.remove(&user_id);
                self.set_presence(user_id, false);
            }
            ServerEvent::Error { message } => {
                self.last_error = Some(message);
            }
        }
    }

    fn receive_message(&mut self, message: MessagePayload) {
        if self.active_chat.as_deref() == Some(message.chat_id.as_str()) {
            // Dedup key is the message id: the same message may arrive via
            // push and via a concurrent history fetch.
            if !self.messages.iter().any(|m| m.id == message.id) {
                self.messages.push(message);
            }
            return;
        }

        // Closed conversation: bump counters and float the entry to the top,
        // synthesizing one if this is the first message we hear of.
        self.unread_count += 1;
        match self
            .conversations
            .iter()
            .position(|c| c.chat_id == message.chat_id)
        {
            Some(index) => {
                let mut entry = self.conversations.remove(index);
                entry.unread_count += 1;
                entry.last_message = message;
                self.conversations.insert(0, entry);
            }
            None => {
                let is_online = self.online_users.contains(&message.sender.id);
                let entry = ChatSummary {
                    chat_id: message.chat_id.clone(),
                    other_user: OtherUser::from_summary(message.sender.clone(), is_online),
                    last_message: message,
                    unread_count: 1,
                };
                self.conversations.insert(0, entry);
            }
        }
    }

    /// Merge one page of history. Page 1 replaces the local list; later pages
    /// prepend older messages, preserving oldest-first order overall.
    pub fn apply_history_page(
        &mut self,
        chat_id: &str,
        mut messages: Vec<MessagePayload>,
        pagination: Pagination,
    ) {
        if self.active_chat.as_deref() != Some(chat_id) {
            self.open_chat(chat_id);
        }
        if pagination.current_page == 1 {
            self.messages = messages;
        } else {
            messages.extend(self.messages.drain(..));
            self.messages = messages;
        }
        self.pagination = Some(pagination);
    }

    /// Replace the conversation list from a REST fetch; the global unread
    /// count is the sum of the per-conversation counts.
    pub fn apply_conversations(&mut self, chats: Vec<ChatSummary>) {
        self.unread_count = chats.iter().map(|c| c.unread_count).sum();
        self.conversations = chats;
    }

    /// Apply a mark-read acknowledgement from the server.
    pub fn apply_mark_read(&mut self, chat_id: &str, modified_count: u64) {
        if let Some(entry) = self
            .conversations
            .iter_mut()
            .find(|c| c.chat_id == chat_id)
        {
            entry.unread_count = 0;
        }
        self.unread_count = (self.unread_count - modified_count as i64).max(0);
        self.notifications.remove(chat_id);

        if self.active_chat.as_deref() == Some(chat_id) {
            for message in &mut self.messages {
                if message.receiver.id == self.user_id {
                    message.is_read = true;
                }
            }
        }
    }

    /// A send of our own was acknowledged: append to the open chat (dedup by
    /// id, the push path may have arrived first) and refresh the entry.
    pub fn apply_send_acknowledged(&mut self, message: MessagePayload) {
        if self.active_chat.as_deref() == Some(message.chat_id.as_str())
            && !self.messages.iter().any(|m| m.id == message.id)
        {
            self.messages.push(message.clone());
        }
        if let Some(index) = self
            .conversations
            .iter()
            .position(|c| c.chat_id == message.chat_id)
        {
            let mut entry = self.conversations.remove(index);
            entry.last_message = message;
            self.conversations.insert(0, entry);
        }
    }

    pub fn apply_delete(&mut self, message_id: Uuid) {
        self.messages.retain(|m| m.id != message_id);
    }

    pub fn is_typing(&self, user_id: Uuid) -> bool {
        self.typing.contains(&user_id)
    }

    fn set_presence(&mut self, user_id: Uuid, online: bool) {
        for entry in &mut self.conversations {
            if entry.other_user.id == user_id {
                entry.other_user.is_online = online;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_id::chat_id_for;
    use crate::models::message::MessageType;
    use crate::models::user::UserSummary;

    fn summary(name: &str) -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            username: name.into(),
            profile_picture: None,
        }
    }

    fn message_between(sender: &UserSummary, receiver: &UserSummary, text: &str) -> MessagePayload {
        MessagePayload {
            id: Uuid::new_v4(),
            chat_id: chat_id_for(sender.id, receiver.id),
            sender: sender.clone(),
            receiver: receiver.clone(),
            content: text.into(),
            message_type: MessageType::Text,
            reply_to: None,
            is_read: false,
            read_at: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn push_to_open_chat_appends_once() {
        let me = summary("me");
        let friend = summary("friend");
        let mut client = ChatClient::new(me.id);
        client.open_chat(&chat_id_for(me.id, friend.id));

        let msg = message_between(&friend, &me, "hi");
        client.apply_event(ServerEvent::ReceiveMessage {
            message: msg.clone(),
        });
        client.apply_event(ServerEvent::ReceiveMessage {
            message: msg.clone(),
        });

        assert_eq!(client.messages.len(), 1);
        // Open-chat delivery does not touch unread counters.
        assert_eq!(client.unread_count, 0);
    }

    #[test]
    fn push_to_closed_chat_bumps_counters_and_synthesizes_entry() {
        let me = summary("me");
        let friend = summary("friend");
        let mut client = ChatClient::new(me.id);

        let msg = message_between(&friend, &me, "hi");
        client.apply_event(ServerEvent::ReceiveMessage {
            message: msg.clone(),
        });

        assert_eq!(client.unread_count, 1);
        assert_eq!(client.conversations.len(), 1);
        let entry = &client.conversations[0];
        assert_eq!(entry.chat_id, msg.chat_id);
        assert_eq!(entry.unread_count, 1);
        assert_eq!(entry.other_user.id, friend.id);
    }

    #[test]
    fn push_moves_existing_conversation_to_top() {
        let me = summary("me");
        let alice = summary("alice");
        let bob = summary("bob");
        let mut client = ChatClient::new(me.id);

        client.apply_event(ServerEvent::ReceiveMessage {
            message: message_between(&alice, &me, "from alice"),
        });
        client.apply_event(ServerEvent::ReceiveMessage {
            message: message_between(&bob, &me, "from bob"),
        });
        assert_eq!(client.conversations[0].other_user.id, bob.id);

        client.apply_event(ServerEvent::ReceiveMessage {
            message: message_between(&alice, &me, "alice again"),
        });
        assert_eq!(client.conversations[0].other_user.id, alice.id);
        assert_eq!(client.conversations[0].unread_count, 2);
        assert_eq!(client.unread_count, 3);
    }

    #[test]
    fn history_page_one_replaces_later_pages_prepend() {
        let me = summary("me");
        let friend = summary("friend");
        let chat = chat_id_for(me.id, friend.id);
        let mut client = ChatClient::new(me.id);

        let newer_a = message_between(&friend, &me, "newer a");
        let newer_b = message_between(&me, &friend, "newer b");
        client.apply_history_page(
            &chat,
            vec![newer_a.clone(), newer_b.clone()],
            Pagination::compute(4, 1, 2),
        );
        assert_eq!(client.messages.len(), 2);
        assert!(client.pagination.unwrap().has_next_page);

        let older_a = message_between(&friend, &me, "older a");
        let older_b = message_between(&me, &friend, "older b");
        client.apply_history_page(
            &chat,
            vec![older_a.clone(), older_b.clone()],
            Pagination::compute(4, 2, 2),
        );

        let contents: Vec<&str> = client.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["older a", "older b", "newer a", "newer b"]);
    }

    #[test]
    fn mark_read_zeroes_conversation_and_floors_global_count() {
        let me = summary("me");
        let friend = summary("friend");
        let mut client = ChatClient::new(me.id);

        let msg = message_between(&friend, &me, "hi");
        let chat = msg.chat_id.clone();
        client.apply_event(ServerEvent::ReceiveMessage { message: msg });
        assert_eq!(client.unread_count, 1);

        client.apply_mark_read(&chat, 5);
        assert_eq!(client.conversations[0].unread_count, 0);
        assert_eq!(client.unread_count, 0);
    }

    #[test]
    fn mark_read_flips_own_received_messages_in_open_chat() {
        let me = summary("me");
        let friend = summary("friend");
        let chat = chat_id_for(me.id, friend.id);
        let mut client = ChatClient::new(me.id);

        client.apply_history_page(
            &chat,
            vec![
                message_between(&friend, &me, "their line"),
                message_between(&me, &friend, "my line"),
            ],
            Pagination::compute(2, 1, 50),
        );
        client.apply_mark_read(&chat, 1);

        assert!(client.messages[0].is_read);
        assert!(!client.messages[1].is_read);
    }

    #[test]
    fn conversations_fetch_recomputes_global_unread() {
        let me = summary("me");
        let friend = summary("friend");
        let mut client = ChatClient::new(me.id);

        let msg = message_between(&friend, &me, "hi");
        let chats = vec![ChatSummary {
            chat_id: msg.chat_id.clone(),
            other_user: OtherUser::from_summary(friend.clone(), false),
            last_message: msg,
            unread_count: 7,
        }];
        client.apply_conversations(chats);
        assert_eq!(client.unread_count, 7);
    }

    #[test]
    fn typing_flags_toggle_and_clear_on_chat_switch() {
        let me = summary("me");
        let friend = summary("friend");
        let mut client = ChatClient::new(me.id);

        client.apply_event(ServerEvent::UserTyping {
            user_id: friend.id,
            is_typing: true,
        });
        assert!(client.is_typing(friend.id));

        client.apply_event(ServerEvent::UserTyping {
            user_id: friend.id,
            is_typing: false,
        });
        assert!(!client.is_typing(friend.id));

        client.apply_event(ServerEvent::UserTyping {
            user_id: friend.id,
            is_typing: true,
        });
        client.open_chat("some_chat");
        assert!(!client.is_typing(friend.id));
    }

    #[test]
    fn presence_events_update_online_set_and_conversations() {
        let me = summary("me");
        let friend = summary("friend");
        let mut client = ChatClient::new(me.id);

        client.apply_event(ServerEvent::ReceiveMessage {
            message: message_between(&friend, &me, "hi"),
        });
        assert!(!client.conversations[0].other_user.is_online);

        client.apply_event(ServerEvent::UserOnline { user_id: friend.id });
        assert!(client.conversations[0].other_user.is_online);
        assert!(client.online_users.contains(&friend.id));

        client.apply_event(ServerEvent::UserOffline { user_id: friend.id });
        assert!(!client.conversations[0].other_user.is_online);
    }

    #[test]
    fn own_send_acknowledgement_dedups_against_push() {
        let me = summary("me");
        let friend = summary("friend");
        let chat = chat_id_for(me.id, friend.id);
        let mut client = ChatClient::new(me.id);
        client.open_chat(&chat);

        let msg = message_between(&me, &friend, "mine");
        client.apply_send_acknowledged(msg.clone());
        client.apply_send_acknowledged(msg.clone());
        assert_eq!(client.messages.len(), 1);
    }

    #[test]
    fn delete_removes_message_locally() {
        let me = summary("me");
        let friend = summary("friend");
        let chat = chat_id_for(me.id, friend.id);
        let mut client = ChatClient::new(me.id);

        let msg = message_between(&me, &friend, "oops");
        client.apply_history_page(&chat, vec![msg.clone()], Pagination::compute(1, 1, 50));
        client.apply_delete(msg.id);
        assert!(client.messages.is_empty());
    }

    #[test]
    fn error_events_are_recorded() {
        let mut client = ChatClient::new(Uuid::new_v4());
        client.apply_event(ServerEvent::Error {
            message: "you can only send messages to your friends".into(),
        });
        assert_eq!(
            client.last_error.as_deref(),
            Some("you can only send messages to your friends")
        );
    }

    #[test]
    fn notification_badges_accumulate_and_clear() {
        let me = summary("me");
        let friend = summary("friend");
        let mut client = ChatClient::new(me.id);
        let chat = chat_id_for(me.id, friend.id);

        for _ in 0..3 {
            client.apply_event(ServerEvent::NewMessageNotification {
                sender_id: friend.id,
                sender_name: friend.username.clone(),
                chat_id: chat.clone(),
            });
        }
        assert_eq!(client.notifications.get(&chat), Some(&3));

        client.apply_mark_read(&chat, 3);
        assert!(client.notifications.get(&chat).is_none());
    }
}
