use chat_service::migrations;
use chat_service::services::friend_service::FriendService;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

#[allow(dead_code)]
pub async fn bootstrap_pool() -> Pool<Postgres> {
    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL env var required for tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("failed to connect to DATABASE_URL");
    migrations::run_all(&pool).await.expect("migrations");
    pool
}

#[allow(dead_code)]
pub async fn seed_user(pool: &Pool<Postgres>, prefix: &str) -> Uuid {
    let id = Uuid::new_v4();
    let username = format!("{prefix}-{}", &id.to_string()[..8]);
    sqlx::query("INSERT INTO users (id, username) VALUES ($1, $2)")
        .bind(id)
        .bind(username)
        .execute(pool)
        .await
        .expect("failed to seed user");
    id
}

/// Two fresh users that are allowed to message each other.
#[allow(dead_code)]
pub async fn seed_friends(pool: &Pool<Postgres>) -> (Uuid, Uuid) {
    let a = seed_user(pool, "a").await;
    let b = seed_user(pool, "b").await;
    FriendService::befriend(pool, a, b)
        .await
        .expect("failed to befriend");
    (a, b)
}

#[allow(dead_code)]
pub async fn cleanup_users(pool: &Pool<Postgres>, users: &[Uuid]) {
    for user in users {
        let _ = sqlx::query("DELETE FROM messages WHERE sender_id = $1 OR receiver_id = $1")
            .bind(user)
            .execute(pool)
            .await;
        let _ = sqlx::query("DELETE FROM friendships WHERE user_id = $1 OR friend_id = $1")
            .bind(user)
            .execute(pool)
            .await;
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user)
            .execute(pool)
            .await;
    }
}
