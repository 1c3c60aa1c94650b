use crate::{config::Config, websocket::router::MessageRouter, websocket::PresenceRegistry};
use sqlx::{Pool, Postgres};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Postgres>,
    pub presence: PresenceRegistry,
    pub router: MessageRouter,
    pub config: Arc<Config>,
}
