use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::AppResult;

/// Read side of the friend graph. The friend-request workflow lives upstream;
/// this service only answers the may-message predicate and (for the accept
/// hook) records the symmetric pair.
pub struct FriendService;

impl FriendService {
    pub async fn are_friends(db: &Pool<Postgres>, a: Uuid, b: Uuid) -> AppResult<bool> {
        let row =
            sqlx::query("SELECT 1 FROM friendships WHERE user_id = $1 AND friend_id = $2 LIMIT 1")
                .bind(a)
                .bind(b)
                .fetch_optional(db)
                .await?;
        Ok(row.is_some())
    }

    /// Insert both directions of a friendship. Idempotent.
    pub async fn befriend(db: &Pool<Postgres>, a: Uuid, b: Uuid) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO friendships (user_id, friend_id) VALUES ($1, $2), ($2, $1) \
             ON CONFLICT DO NOTHING",
        )
        .bind(a)
        .bind(b)
        .execute(db)
        .await?;
        Ok(())
    }
}
