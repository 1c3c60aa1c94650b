use chat_service::{
    config::Config,
    db, error, logging, migrations, routes,
    state::AppState,
    websocket::{router::MessageRouter, PresenceRegistry},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let config = Arc::new(Config::from_env()?);

    let db = db::init_pool(&config.database_url)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    // Schema must be in sync before serving traffic.
    migrations::run_all(&db)
        .await
        .map_err(|e| error::AppError::StartServer(format!("database migrations failed: {e}")))?;

    // Presence lives for the life of the process; everyone is offline again
    // after a restart until they reconnect.
    let presence = PresenceRegistry::new();
    let router = MessageRouter::new(presence.clone());

    let state = AppState {
        db,
        presence,
        router,
        config: config.clone(),
    };

    let app = routes::build_router(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%bind_addr, "starting chat-service");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    Ok(())
}
