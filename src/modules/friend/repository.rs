use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::FriendPeerRow;
use crate::modules::friend::schema::{FriendshipEntity, FriendshipStatus};

#[async_trait::async_trait]
pub trait FriendshipRepository {
    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::ServiceError>;

    /// Lookup by unordered pair: matches whichever direction the request
    /// was originally sent in.
    async fn find_by_pair(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::ServiceError>;

    /// Insert a new `PENDING` record. Raced duplicates for the same pair
    /// fail on the unique pair index and surface as a Conflict.
    async fn create_pending(
        &self,
        requester_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendshipEntity, error::ServiceError>;

    /// Conditional status write: only applies while the row is still in
    /// `from`. `None` means a concurrent transition got there first.
    async fn update_status(
        &self,
        id: &Uuid,
        from: FriendshipStatus,
        to: FriendshipStatus,
    ) -> Result<Option<FriendshipEntity>, error::ServiceError>;

    /// Conditional delete, same contract as `update_status`.
    async fn delete_in_status(
        &self,
        id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<bool, error::ServiceError>;

    async fn list_accepted(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendPeerRow>, error::ServiceError>;

    async fn list_pending_sent(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendPeerRow>, error::ServiceError>;

    async fn list_pending_received(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendPeerRow>, error::ServiceError>;
}
