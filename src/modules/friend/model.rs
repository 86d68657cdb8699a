use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::friend::schema::{FriendshipEntity, FriendshipStatus};
use crate::modules::user::model::UserSummary;

/// The friendship record as returned by the mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<FriendshipEntity> for FriendshipResponse {
    fn from(entity: FriendshipEntity) -> Self {
        FriendshipResponse {
            id: entity.id,
            requester_id: entity.requester_id,
            receiver_id: entity.receiver_id,
            status: entity.status,
            created_at: entity.created_at,
        }
    }
}

/// One list entry: the peer's public summary plus the friendship id the
/// client needs to accept, decline, cancel or remove it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendEntry {
    pub friendship_id: Uuid,
    pub user: UserSummary,
    pub since: chrono::DateTime<chrono::Utc>,
}

/// Join row backing the three list queries: friendship id + the user on
/// the other side of it.
#[derive(FromRow)]
pub struct FriendPeerRow {
    pub friendship_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<FriendPeerRow> for FriendEntry {
    fn from(row: FriendPeerRow) -> Self {
        FriendEntry {
            friendship_id: row.friendship_id,
            user: UserSummary {
                id: row.user_id,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                avatar_url: row.avatar_url,
                is_online: row.is_online,
            },
            since: row.created_at,
        }
    }
}

/// The three-way view: every relationship involving the caller lands in
/// exactly one of these lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendListResponse {
    pub friends: Vec<FriendEntry>,
    pub outgoing: Vec<FriendEntry>,
    pub incoming: Vec<FriendEntry>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub receiver_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchUsersQuery {
    #[validate(length(max = 100, message = "Search query too long"))]
    pub q: Option<String>,
}
