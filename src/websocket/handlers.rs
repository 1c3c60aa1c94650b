use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::warn;
use uuid::Uuid;

use crate::middleware::auth::verify_token;
use crate::services::message_service::MessageService;
use crate::state::AppState;
use crate::websocket::message_types::{ClientEvent, ServerEvent};
use crate::websocket::ConnectionId;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let Some(token) = params.token else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let user_id = match verify_token(&token, &state.config.jwt_secret) {
        Ok(user_id) => user_id,
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(state, user_id, socket))
}

async fn handle_socket(state: AppState, user_id: Uuid, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    // Everything pushed to this connection goes through one channel; the
    // registry and router hold its sending half.
    let (tx, mut rx) = unbounded_channel::<String>();
    let mut connection: Option<ConnectionId> = None;

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(text) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => {
                                handle_client_event(&state, user_id, &tx, &mut connection, event)
                                    .await;
                            }
                            Err(err) => {
                                warn!(%user_id, error = %err, "unparseable client event");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    // A stale teardown never evicts a newer connection for the same user:
    // the registry compares connection ids.
    if let Some(connection_id) = connection {
        state.presence.remove(user_id, connection_id);
    }
}

async fn handle_client_event(
    state: &AppState,
    user_id: Uuid,
    tx: &UnboundedSender<String>,
    connection: &mut Option<ConnectionId>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Join { user_id: claimed } => {
            if claimed != user_id {
                warn!(%user_id, %claimed, "join for a different user ignored");
                return;
            }
            if connection.is_none() {
                *connection = Some(state.presence.announce(user_id, tx.clone()));
            }
        }
        ClientEvent::SendMessage {
            receiver_id,
            content,
            message_type,
            reply_to,
        } => {
            let sent = match MessageService::parse_message_type(message_type.as_deref()) {
                Ok(message_type) => {
                    MessageService::send_checked(
                        &state.db,
                        user_id,
                        receiver_id,
                        &content,
                        message_type,
                        reply_to,
                    )
                    .await
                }
                Err(err) => Err(err),
            };

            match sent {
                Ok(payload) => state.router.route_new_message(&payload),
                Err(err) => {
                    // Rejections are reported to the sending socket only.
                    if let Ok(text) = serde_json::to_string(&ServerEvent::Error {
                        message: err.to_string(),
                    }) {
                        let _ = tx.send(text);
                    }
                }
            }
        }
        ClientEvent::Typing {
            sender_id,
            receiver_id,
            is_typing,
        } => {
            // A connection can only emit typing events as itself.
            if sender_id != user_id {
                return;
            }
            state.router.route_typing(sender_id, receiver_id, is_typing);
        }
    }
}
