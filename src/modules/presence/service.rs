use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        notify::{FanoutEvent, NotificationSink},
        presence::model::PresenceResponse,
        user::repository::UserRepository,
    },
};

/// Owns the online/offline flag transition. The flag lives on the user
/// record; this service is the only writer.
#[derive(Clone)]
pub struct PresenceService<U>
where
    U: UserRepository + Send + Sync,
{
    user_repo: Arc<U>,
    sink: Arc<dyn NotificationSink>,
}

impl<U> PresenceService<U>
where
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(user_repo: Arc<U>, sink: Arc<dyn NotificationSink>) -> Self {
        PresenceService { user_repo, sink }
    }

    /// Set the presence flag to `desired`. The storage write is a single
    /// atomic statement that returns the persisted value; when a
    /// concurrent writer still wins between our write and its read-back,
    /// the write is retried once before giving up with a Conflict.
    /// Sign-in never calls this: presence only changes on an explicit
    /// status update, so a user keeps their last known state.
    pub async fn set_online(
        &self,
        user_id: Uuid,
        desired: bool,
    ) -> Result<PresenceResponse, error::ServiceError> {
        let mut persisted = self.write_presence(&user_id, desired).await?;

        if persisted != desired {
            log::warn!("presence write for {} lost to a concurrent update, retrying", user_id);
            persisted = self.write_presence(&user_id, desired).await?;
        }

        if persisted != desired {
            return Err(error::ServiceError::conflict(
                "Presence update could not be verified",
            ));
        }

        self.sink.publish(FanoutEvent::PresenceChanged { user_id, is_online: desired });
        Ok(PresenceResponse { user_id, is_online: desired })
    }

    async fn write_presence(
        &self,
        user_id: &Uuid,
        desired: bool,
    ) -> Result<bool, error::ServiceError> {
        self.user_repo
            .set_presence(user_id, desired)
            .await?
            .ok_or_else(|| error::ServiceError::not_found("User not found"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::api::error::ServiceError;
    use crate::modules::friend::service::testing::{MemoryUserStore, RecordingSink};
    use crate::modules::user::model::{InsertUser, UpdateProfile};
    use crate::modules::user::schema::UserEntity;

    fn new_id() -> Uuid {
        Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext))
    }

    fn service_over(
        users: Arc<MemoryUserStore>,
    ) -> (PresenceService<MemoryUserStore>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (PresenceService::with_dependencies(users, sink.clone()), sink)
    }

    #[actix_web::test]
    async fn unknown_user_is_not_found() {
        let users = Arc::new(MemoryUserStore::default());
        let (service, sink) = service_over(users);

        let err = service.set_online(new_id(), true).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn sequential_updates_settle_on_the_last_value() {
        let users = Arc::new(MemoryUserStore::default());
        let alice = users.add_user("alice", "Alice", "Archer");
        let (service, sink) = service_over(users.clone());

        service.set_online(alice, true).await.unwrap();
        let response = service.set_online(alice, false).await.unwrap();

        assert!(!response.is_online);
        assert!(!users.find_by_id(&alice).await.unwrap().unwrap().is_online);
        assert_eq!(sink.events.lock().unwrap().len(), 2);
    }

    /// A store whose first `lose_writes` presence writes are overwritten
    /// by a concurrent writer before the read-back.
    struct RacyUserStore {
        inner: MemoryUserStore,
        lose_writes: AtomicUsize,
    }

    impl RacyUserStore {
        fn with_user(lose_writes: usize) -> (Arc<Self>, Uuid) {
            let inner = MemoryUserStore::default();
            let id = inner.add_user("alice", "Alice", "Archer");
            (
                Arc::new(Self { inner, lose_writes: AtomicUsize::new(lose_writes) }),
                id,
            )
        }
    }

    #[async_trait::async_trait]
    impl crate::modules::user::repository::UserRepository for RacyUserStore {
        async fn find_by_id(
            &self,
            id: &Uuid,
        ) -> Result<Option<UserEntity>, ServiceError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<UserEntity>, ServiceError> {
            self.inner.find_by_username(username).await
        }

        async fn create(&self, user: &InsertUser) -> Result<Uuid, ServiceError> {
            self.inner.create(user).await
        }

        async fn update_profile(
            &self,
            id: &Uuid,
            update: &UpdateProfile,
        ) -> Result<UserEntity, ServiceError> {
            self.inner.update_profile(id, update).await
        }

        async fn search_users(
            &self,
            query: &str,
            exclude: &Uuid,
            limit: i32,
        ) -> Result<Vec<UserEntity>, ServiceError> {
            self.inner.search_users(query, exclude, limit).await
        }

        async fn set_presence(
            &self,
            id: &Uuid,
            online: bool,
        ) -> Result<Option<bool>, ServiceError> {
            if self.lose_writes.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                n.checked_sub(1)
            }).is_ok()
            {
                // a concurrent writer got in after us: the persisted value
                // is the opposite of what we asked for
                return self.inner.set_presence(id, !online).await;
            }
            self.inner.set_presence(id, online).await
        }
    }

    #[actix_web::test]
    async fn a_lost_write_is_retried_once() {
        let (users, alice) = RacyUserStore::with_user(1);
        let sink = Arc::new(RecordingSink::default());
        let service = PresenceService::with_dependencies(users.clone(), sink.clone());

        let response = service.set_online(alice, true).await.unwrap();

        assert!(response.is_online);
        assert!(users.find_by_id(&alice).await.unwrap().unwrap().is_online);
        assert_eq!(sink.events.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn a_persistently_lost_write_is_a_conflict() {
        let (users, alice) = RacyUserStore::with_user(usize::MAX);
        let sink = Arc::new(RecordingSink::default());
        let service = PresenceService::with_dependencies(users.clone(), sink.clone());

        let err = service.set_online(alice, true).await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        // no event for a transition that did not stick
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn racing_login_and_disconnect_both_verify() {
        let users = Arc::new(MemoryUserStore::default());
        let alice = users.add_user("alice", "Alice", "Archer");
        let (service, sink) = service_over(users.clone());

        let login = service.set_online(alice, true);
        let disconnect = service.set_online(alice, false);
        let (a, b) = tokio::join!(login, disconnect);

        // both complete without corruption; the stored flag is whichever
        // write landed last
        assert!(a.unwrap().is_online);
        assert!(!b.unwrap().is_online);
        assert_eq!(sink.events.lock().unwrap().len(), 2);
    }
}
