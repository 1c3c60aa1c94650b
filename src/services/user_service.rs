use sqlx::{Pool, Postgres, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::user::UserSummary;

pub struct UserService;

impl UserService {
    pub async fn get_summary(
        db: &Pool<Postgres>,
        user_id: Uuid,
    ) -> AppResult<Option<UserSummary>> {
        let row = sqlx::query("SELECT id, username, profile_picture FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;

        Ok(row.map(|r| UserSummary {
            id: r.get("id"),
            username: r.get("username"),
            profile_picture: r.get("profile_picture"),
        }))
    }

    /// Batch lookup used when shaping conversation lists.
    pub async fn get_summaries(
        db: &Pool<Postgres>,
        user_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, UserSummary>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows =
            sqlx::query("SELECT id, username, profile_picture FROM users WHERE id = ANY($1)")
                .bind(user_ids)
                .fetch_all(db)
                .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let summary = UserSummary {
                    id: r.get("id"),
                    username: r.get("username"),
                    profile_picture: r.get("profile_picture"),
                };
                (summary.id, summary)
            })
            .collect())
    }
}
