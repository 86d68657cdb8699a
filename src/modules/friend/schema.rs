use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "friendship_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    #[sqlx(rename = "PENDING")]
    Pending,
    #[sqlx(rename = "ACCEPTED")]
    Accepted,
    #[sqlx(rename = "REJECTED")]
    Rejected,
}

/// One row per unordered user pair, whatever the direction of the original
/// request. The `friendships_pair_key` unique index on
/// (LEAST(requester_id, receiver_id), GREATEST(requester_id, receiver_id))
/// is the authoritative duplicate-pair guard.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendshipEntity {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl FriendshipEntity {
    /// The other side of the relationship, from `user_id`'s point of view.
    #[allow(dead_code)]
    pub fn peer_of(&self, user_id: &Uuid) -> Uuid {
        if self.requester_id == *user_id {
            self.receiver_id
        } else {
            self.requester_id
        }
    }
}
