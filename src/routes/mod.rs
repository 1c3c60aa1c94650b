use axum::extract::State;
use axum::middleware;
use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use utoipa::OpenApi;

use crate::state::AppState;
use crate::websocket::handlers::ws_handler;

pub mod chat;
use chat::{
    delete_message, get_all_chats, get_chat_messages, get_unread_count, mark_as_read, send_message,
};

async fn openapi_json() -> Json<serde_json::Value> {
    Json(serde_json::to_value(crate::openapi::ApiDoc::openapi()).unwrap_or_default())
}

async fn metrics(State(state): State<AppState>) -> String {
    json!({
        "service": "chat-service",
        "version": "0.1.0",
        "status": "healthy",
        "online_users": state.presence.online_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
    .to_string()
}

pub fn build_router(state: AppState) -> Router {
    // Introspection endpoints stay public for healthchecks.
    let introspection = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(metrics))
        .route("/openapi.json", get(openapi_json));

    let api = Router::new()
        .route("/send", post(send_message))
        .route("/messages/:friend_id", get(get_chat_messages))
        .route("/conversations", get(get_all_chats))
        .route("/read/:friend_id", put(mark_as_read))
        .route("/message/:message_id", delete(delete_message))
        .route("/unread-count", get(get_unread_count))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    // The live channel authenticates via query token inside the handler,
    // since browser WebSocket clients cannot set an Authorization header.
    let router = introspection
        .route("/ws", get(ws_handler))
        .nest("/api/chat", api);

    crate::middleware::with_defaults(router, &state.config).with_state(state)
}
