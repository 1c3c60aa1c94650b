//! End-to-end flows across store, presence, router and the client state
//! machine. Run with a live database:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

mod common;

use chat_service::chat_id::chat_id_for;
use chat_service::client::ChatClient;
use chat_service::models::message::MessageType;
use chat_service::services::message_service::MessageService;
use chat_service::websocket::message_types::ServerEvent;
use chat_service::websocket::router::MessageRouter;
use chat_service::websocket::PresenceRegistry;
use tokio::sync::mpsc::unbounded_channel;

#[tokio::test]
#[ignore]
async fn offline_recipient_catches_up_via_pagination() {
    let pool = common::bootstrap_pool().await;
    let (a, b) = common::seed_friends(&pool).await;
    let chat = chat_id_for(a, b);

    let presence = PresenceRegistry::new();
    let router = MessageRouter::new(presence.clone());

    // A sends while B is offline: the persist succeeds and the route is a
    // silent no-op.
    let sent = MessageService::send_checked(&pool, a, b, "hello", MessageType::Text, None)
        .await
        .expect("send failed");
    router.route_new_message(&sent);
    assert!(!presence.is_online(b));

    // B fetches later and sees the message unread.
    let (messages, _) = MessageService::get_chat_messages(&pool, &chat, 1, 50)
        .await
        .expect("page failed");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello");
    assert!(!messages[0].is_read);

    let modified = MessageService::mark_read(&pool, &chat, b).await.expect("mark failed");
    assert_eq!(modified, 1);
    let again = MessageService::mark_read(&pool, &chat, b).await.expect("mark failed");
    assert_eq!(again, 0);

    common::cleanup_users(&pool, &[a, b]).await;
}

#[tokio::test]
#[ignore]
async fn online_recipient_gets_dual_push_that_merges_cleanly() {
    let pool = common::bootstrap_pool().await;
    let (a, b) = common::seed_friends(&pool).await;
    let chat = chat_id_for(a, b);

    let presence = PresenceRegistry::new();
    let router = MessageRouter::new(presence.clone());

    let (tx, mut rx) = unbounded_channel();
    presence.announce(b, tx);

    let sent = MessageService::send_checked(&pool, a, b, "hi", MessageType::Text, None)
        .await
        .expect("send failed");
    router.route_new_message(&sent);

    let receive: ServerEvent =
        serde_json::from_str(&rx.try_recv().expect("no receiveMessage")).expect("bad event");
    let notification: ServerEvent =
        serde_json::from_str(&rx.try_recv().expect("no notification")).expect("bad event");

    let ServerEvent::ReceiveMessage { message } = &receive else {
        panic!("expected receiveMessage, got {receive:?}");
    };
    assert_eq!(message.id, sent.id);

    let ServerEvent::NewMessageNotification { chat_id, sender_id, .. } = &notification else {
        panic!("expected newMessageNotification, got {notification:?}");
    };
    assert_eq!(chat_id, &chat);
    assert_eq!(*sender_id, a);

    // B's client has the conversation closed: the push bumps unread state
    // and surfaces a badge.
    let mut client = ChatClient::new(b);
    client.apply_event(receive);
    client.apply_event(notification);
    assert_eq!(client.unread_count, 1);
    assert_eq!(client.conversations.len(), 1);
    assert_eq!(client.conversations[0].unread_count, 1);
    assert_eq!(client.notifications.get(&chat), Some(&1));

    // Duplicate delivery of the same payload cannot double-count an open
    // conversation.
    client.open_chat(&chat);
    let (history, pagination) = MessageService::get_chat_messages(&pool, &chat, 1, 50)
        .await
        .expect("page failed");
    client.apply_history_page(&chat, history, pagination);
    client.apply_event(ServerEvent::ReceiveMessage {
        message: sent.clone(),
    });
    assert_eq!(client.messages.len(), 1);

    common::cleanup_users(&pool, &[a, b]).await;
}

#[tokio::test]
#[ignore]
async fn delete_disappears_from_subsequent_pages() {
    let pool = common::bootstrap_pool().await;
    let (a, b) = common::seed_friends(&pool).await;
    let chat = chat_id_for(a, b);

    let first = MessageService::send_checked(&pool, a, b, "first", MessageType::Text, None)
        .await
        .expect("send failed");
    let second = MessageService::send_checked(&pool, b, a, "second", MessageType::Text, None)
        .await
        .expect("send failed");

    MessageService::delete_message(&pool, first.id, a)
        .await
        .expect("delete failed");

    let (messages, _) = MessageService::get_chat_messages(&pool, &chat, 1, 50)
        .await
        .expect("page failed");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, second.id);

    // The other participant cannot delete what they did not send.
    let denied = MessageService::delete_message(&pool, second.id, a).await;
    assert!(denied.is_err());

    common::cleanup_users(&pool, &[a, b]).await;
}

#[tokio::test]
#[ignore]
async fn reconnect_supersedes_stale_connection_for_routing() {
    let pool = common::bootstrap_pool().await;
    let (a, b) = common::seed_friends(&pool).await;

    let presence = PresenceRegistry::new();
    let router = MessageRouter::new(presence.clone());

    let (old_tx, mut old_rx) = unbounded_channel();
    let old_conn = presence.announce(b, old_tx);
    let (new_tx, mut new_rx) = unbounded_channel();
    presence.announce(b, new_tx);

    // The old socket's teardown fires late; it must not take B offline.
    presence.remove(b, old_conn);
    assert!(presence.is_online(b));

    let sent = MessageService::send_checked(&pool, a, b, "to the new socket", MessageType::Text, None)
        .await
        .expect("send failed");
    router.route_new_message(&sent);

    assert!(new_rx.try_recv().is_ok());
    assert!(old_rx.try_recv().is_err());

    common::cleanup_users(&pool, &[a, b]).await;
}
