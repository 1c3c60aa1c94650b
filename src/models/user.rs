use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Public slice of a user row embedded in message payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub profile_picture: Option<String>,
}

/// The counterpart of a conversation as shown in the chat list. `is_online`
/// comes from the in-memory presence registry, never from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtherUser {
    pub id: Uuid,
    pub username: String,
    pub profile_picture: Option<String>,
    pub is_online: bool,
}

impl OtherUser {
    pub fn from_summary(summary: UserSummary, is_online: bool) -> Self {
        Self {
            id: summary.id,
            username: summary.username,
            profile_picture: summary.profile_picture,
            is_online,
        }
    }
}
