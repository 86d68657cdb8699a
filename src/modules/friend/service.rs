use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::FriendshipResponse,
            repository::FriendshipRepository,
            schema::FriendshipEntity,
            transition::{self, Action, ActorRole, Effect},
        },
        notify::{FanoutEvent, NotificationSink},
        user::repository::UserRepository,
    },
};

const PAIR_EXISTS: &str = "A friendship or pending request already exists with this user";

/// Owns every friendship state transition. Reads go through
/// `FriendshipView` instead; this service only mutates.
#[derive(Clone)]
pub struct FriendshipService<R, U>
where
    R: FriendshipRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
    sink: Arc<dyn NotificationSink>,
}

impl<R, U> FriendshipService<R, U>
where
    R: FriendshipRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(
        friend_repo: Arc<R>,
        user_repo: Arc<U>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        FriendshipService { friend_repo, user_repo, sink }
    }

    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendshipResponse, error::ServiceError> {
        if receiver_id == sender_id {
            return Err(error::ServiceError::bad_request(
                "Cannot send a friend request to yourself",
            ));
        }

        if self.user_repo.find_by_id(&receiver_id).await?.is_none() {
            return Err(error::ServiceError::not_found("Recipient user not found"));
        }

        // fast path for a clean error; the unique pair index is the real
        // guard against a raced duplicate
        if self.friend_repo.find_by_pair(&sender_id, &receiver_id).await?.is_some() {
            return Err(error::ServiceError::conflict(PAIR_EXISTS));
        }

        let friendship = match self.friend_repo.create_pending(&sender_id, &receiver_id).await {
            Ok(friendship) => friendship,
            Err(error::ServiceError::Conflict(_)) => {
                return Err(error::ServiceError::conflict(PAIR_EXISTS));
            }
            Err(e) => return Err(e),
        };

        self.sink.publish(FanoutEvent::request_created(&friendship));
        Ok(friendship.into())
    }

    pub async fn accept_friend_request(
        &self,
        actor_id: Uuid,
        friendship_id: Uuid,
    ) -> Result<FriendshipResponse, error::ServiceError> {
        let accepted = self
            .run_transition(actor_id, friendship_id, Action::Accept, "Friend request not found")
            .await?;

        self.sink.publish(FanoutEvent::request_accepted(&accepted));
        Ok(accepted.into())
    }

    pub async fn decline_friend_request(
        &self,
        actor_id: Uuid,
        friendship_id: Uuid,
    ) -> Result<FriendshipResponse, error::ServiceError> {
        let declined = self
            .run_transition(actor_id, friendship_id, Action::Decline, "Friend request not found")
            .await?;

        self.sink.publish(FanoutEvent::request_declined(&declined));
        Ok(declined.into())
    }

    pub async fn cancel_friend_request(
        &self,
        actor_id: Uuid,
        friendship_id: Uuid,
    ) -> Result<(), error::ServiceError> {
        let canceled = self
            .run_transition(actor_id, friendship_id, Action::Cancel, "Friend request not found")
            .await?;

        self.sink.publish(FanoutEvent::request_canceled(&canceled));
        Ok(())
    }

    pub async fn remove_friend(
        &self,
        actor_id: Uuid,
        friendship_id: Uuid,
    ) -> Result<(), error::ServiceError> {
        let removed = self
            .run_transition(actor_id, friendship_id, Action::Remove, "Friendship not found")
            .await?;

        self.sink.publish(FanoutEvent::friend_removed(&removed));
        Ok(())
    }

    /// Load, authorize through the transition table, then apply the effect
    /// with a conditional write. A `None`/false conditional write means a
    /// concurrent transition won; the caller gets a Conflict, never a
    /// partial application.
    async fn run_transition(
        &self,
        actor_id: Uuid,
        friendship_id: Uuid,
        action: Action,
        missing: &'static str,
    ) -> Result<FriendshipEntity, error::ServiceError> {
        let friendship = self
            .friend_repo
            .find_by_id(&friendship_id)
            .await?
            .ok_or_else(|| error::ServiceError::not_found(missing))?;

        let role = ActorRole::of(&actor_id, &friendship);

        match transition::apply(friendship.status, action, role)? {
            Effect::SetStatus(to) => self
                .friend_repo
                .update_status(&friendship_id, friendship.status, to)
                .await?
                .ok_or_else(|| {
                    error::ServiceError::conflict("Friend request was already handled")
                }),
            Effect::Delete => {
                let deleted =
                    self.friend_repo.delete_in_status(&friendship_id, friendship.status).await?;
                if !deleted {
                    return Err(error::ServiceError::conflict(
                        "Friend request was already handled",
                    ));
                }
                Ok(friendship)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;
    use crate::modules::friend::model::FriendPeerRow;
    use crate::modules::friend::schema::FriendshipStatus;
    use crate::modules::user::model::{InsertUser, UpdateProfile};
    use crate::modules::user::schema::{UserEntity, UserRole};

    fn new_id() -> Uuid {
        Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext))
    }

    #[derive(Default)]
    pub struct MemoryUserStore {
        pub users: Mutex<Vec<UserEntity>>,
    }

    impl MemoryUserStore {
        pub fn add_user(&self, username: &str, first_name: &str, last_name: &str) -> Uuid {
            let id = new_id();
            self.users.lock().unwrap().push(UserEntity {
                id,
                username: username.to_string(),
                email: format!("{username}@example.com"),
                hash_password: "x".to_string(),
                role: UserRole::User,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                avatar_url: None,
                bio: None,
                is_online: false,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            });
            id
        }
    }

    #[async_trait::async_trait]
    impl UserRepository for MemoryUserStore {
        async fn find_by_id(
            &self,
            id: &Uuid,
        ) -> Result<Option<UserEntity>, error::ServiceError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
        }

        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<UserEntity>, error::ServiceError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username.eq_ignore_ascii_case(username))
                .cloned())
        }

        async fn create(&self, user: &InsertUser) -> Result<Uuid, error::ServiceError> {
            Ok(self.add_user(&user.username, &user.first_name, &user.last_name))
        }

        async fn update_profile(
            &self,
            id: &Uuid,
            update: &UpdateProfile,
        ) -> Result<UserEntity, error::ServiceError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.id == *id)
                .ok_or_else(|| error::ServiceError::not_found("User not found"))?;
            if let Some(bio) = &update.bio {
                user.bio = Some(bio.clone());
            }
            if let Some(avatar_url) = &update.avatar_url {
                user.avatar_url = Some(avatar_url.clone());
            }
            if let Some(hash) = &update.hash_password {
                user.hash_password = hash.clone();
            }
            Ok(user.clone())
        }

        async fn search_users(
            &self,
            query: &str,
            exclude: &Uuid,
            limit: i32,
        ) -> Result<Vec<UserEntity>, error::ServiceError> {
            let needle = query.to_lowercase();
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.id != *exclude)
                .filter(|u| {
                    u.username.to_lowercase().contains(&needle)
                        || u.first_name.to_lowercase().contains(&needle)
                        || u.last_name.to_lowercase().contains(&needle)
                        || u.email.to_lowercase().contains(&needle)
                })
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn set_presence(
            &self,
            id: &Uuid,
            online: bool,
        ) -> Result<Option<bool>, error::ServiceError> {
            let mut users = self.users.lock().unwrap();
            match users.iter_mut().find(|u| u.id == *id) {
                Some(user) => {
                    user.is_online = online;
                    Ok(Some(user.is_online))
                }
                None => Ok(None),
            }
        }
    }

    pub struct MemoryFriendStore {
        pub users: Arc<MemoryUserStore>,
        pub rows: Mutex<Vec<FriendshipEntity>>,
    }

    impl MemoryFriendStore {
        pub fn new(users: Arc<MemoryUserStore>) -> Self {
            Self { users, rows: Mutex::new(Vec::new()) }
        }

        fn peer_row(&self, friendship: &FriendshipEntity, peer_id: Uuid) -> FriendPeerRow {
            let users = self.users.users.lock().unwrap();
            let user = users.iter().find(|u| u.id == peer_id).expect("peer exists");
            FriendPeerRow {
                friendship_id: friendship.id,
                user_id: user.id,
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                avatar_url: user.avatar_url.clone(),
                is_online: user.is_online,
                created_at: friendship.created_at,
            }
        }
    }

    #[async_trait::async_trait]
    impl FriendshipRepository for MemoryFriendStore {
        async fn find_by_id(
            &self,
            id: &Uuid,
        ) -> Result<Option<FriendshipEntity>, error::ServiceError> {
            Ok(self.rows.lock().unwrap().iter().find(|f| f.id == *id).cloned())
        }

        async fn find_by_pair(
            &self,
            user_id_a: &Uuid,
            user_id_b: &Uuid,
        ) -> Result<Option<FriendshipEntity>, error::ServiceError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|f| {
                    (f.requester_id == *user_id_a && f.receiver_id == *user_id_b)
                        || (f.requester_id == *user_id_b && f.receiver_id == *user_id_a)
                })
                .cloned())
        }

        async fn create_pending(
            &self,
            requester_id: &Uuid,
            receiver_id: &Uuid,
        ) -> Result<FriendshipEntity, error::ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            // the unique pair index, in memory
            let exists = rows.iter().any(|f| {
                (f.requester_id == *requester_id && f.receiver_id == *receiver_id)
                    || (f.requester_id == *receiver_id && f.receiver_id == *requester_id)
            });
            if exists {
                return Err(error::ServiceError::conflict("Pair already exists"));
            }
            let friendship = FriendshipEntity {
                id: new_id(),
                requester_id: *requester_id,
                receiver_id: *receiver_id,
                status: FriendshipStatus::Pending,
                created_at: chrono::Utc::now(),
            };
            rows.push(friendship.clone());
            Ok(friendship)
        }

        async fn update_status(
            &self,
            id: &Uuid,
            from: FriendshipStatus,
            to: FriendshipStatus,
        ) -> Result<Option<FriendshipEntity>, error::ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|f| f.id == *id && f.status == from) {
                Some(row) => {
                    row.status = to;
                    Ok(Some(row.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete_in_status(
            &self,
            id: &Uuid,
            status: FriendshipStatus,
        ) -> Result<bool, error::ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|f| !(f.id == *id && f.status == status));
            Ok(rows.len() < before)
        }

        async fn list_accepted(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<FriendPeerRow>, error::ServiceError> {
            let rows: Vec<FriendshipEntity> = self.rows.lock().unwrap().clone();
            Ok(rows
                .iter()
                .filter(|f| f.status == FriendshipStatus::Accepted)
                .filter(|f| f.requester_id == *user_id || f.receiver_id == *user_id)
                .map(|f| self.peer_row(f, f.peer_of(user_id)))
                .collect())
        }

        async fn list_pending_sent(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<FriendPeerRow>, error::ServiceError> {
            let rows: Vec<FriendshipEntity> = self.rows.lock().unwrap().clone();
            Ok(rows
                .iter()
                .filter(|f| f.status == FriendshipStatus::Pending && f.requester_id == *user_id)
                .map(|f| self.peer_row(f, f.receiver_id))
                .collect())
        }

        async fn list_pending_received(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<FriendPeerRow>, error::ServiceError> {
            let rows: Vec<FriendshipEntity> = self.rows.lock().unwrap().clone();
            Ok(rows
                .iter()
                .filter(|f| f.status == FriendshipStatus::Pending && f.receiver_id == *user_id)
                .map(|f| self.peer_row(f, f.requester_id))
                .collect())
        }
    }

    #[derive(Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<FanoutEvent>>,
    }

    impl NotificationSink for RecordingSink {
        fn publish(&self, event: FanoutEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    pub struct Fixture {
        pub users: Arc<MemoryUserStore>,
        pub friends: Arc<MemoryFriendStore>,
        pub sink: Arc<RecordingSink>,
        pub service: FriendshipService<MemoryFriendStore, MemoryUserStore>,
    }

    pub fn fixture() -> Fixture {
        let users = Arc::new(MemoryUserStore::default());
        let friends = Arc::new(MemoryFriendStore::new(users.clone()));
        let sink = Arc::new(RecordingSink::default());
        let service = FriendshipService::with_dependencies(
            friends.clone(),
            users.clone(),
            sink.clone(),
        );
        Fixture { users, friends, sink, service }
    }
}
