use uuid::Uuid;

use crate::{
    api::error,
    modules::user::model::{InsertUser, UpdateProfile},
    modules::user::schema::UserEntity,
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::ServiceError>;

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::ServiceError>;

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::ServiceError>;

    async fn update_profile(
        &self,
        id: &Uuid,
        update: &UpdateProfile,
    ) -> Result<UserEntity, error::ServiceError>;

    /// Case-insensitive substring search over username, name parts and
    /// email, excluding one user (the caller).
    async fn search_users(
        &self,
        query: &str,
        exclude: &Uuid,
        limit: i32,
    ) -> Result<Vec<UserEntity>, error::ServiceError>;

    /// Atomically write the presence flag and return the value that was
    /// persisted, or `None` when the user does not exist.
    async fn set_presence(
        &self,
        id: &Uuid,
        online: bool,
    ) -> Result<Option<bool>, error::ServiceError>;
}
