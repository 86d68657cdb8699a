use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{FriendEntry, FriendListResponse},
            repository::FriendshipRepository,
        },
        user::{model::UserSummary, repository::UserRepository},
    },
};

const SEARCH_LIMIT: i32 = 20;

/// Read-side aggregator over the friendship and user stores. Never
/// mutates anything.
#[derive(Clone)]
pub struct FriendshipView<R, U>
where
    R: FriendshipRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> FriendshipView<R, U>
where
    R: FriendshipRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        FriendshipView { friend_repo, user_repo }
    }

    /// Every relationship involving `user_id`, partitioned by status and
    /// direction: accepted friendships, pending requests the user sent,
    /// pending requests waiting on the user.
    pub async fn friends_list(
        &self,
        user_id: Uuid,
    ) -> Result<FriendListResponse, error::ServiceError> {
        let (friends, outgoing, incoming) = tokio::try_join!(
            self.friend_repo.list_accepted(&user_id),
            self.friend_repo.list_pending_sent(&user_id),
            self.friend_repo.list_pending_received(&user_id),
        )?;

        Ok(FriendListResponse {
            friends: friends.into_iter().map(FriendEntry::from).collect(),
            outgoing: outgoing.into_iter().map(FriendEntry::from).collect(),
            incoming: incoming.into_iter().map(FriendEntry::from).collect(),
        })
    }

    /// Substring search over usernames, name parts and email, excluding
    /// the caller. An empty query is an empty result, not an error.
    pub async fn search_users(
        &self,
        caller_id: Uuid,
        query: Option<String>,
    ) -> Result<Vec<UserSummary>, error::ServiceError> {
        let query = match query {
            Some(q) if !q.trim().is_empty() => q,
            _ => return Ok(Vec::new()),
        };

        let users = self.user_repo.search_users(query.trim(), &caller_id, SEARCH_LIMIT).await?;
        Ok(users.into_iter().map(UserSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::friend::service::testing::{fixture, MemoryFriendStore, MemoryUserStore};

    fn view_of(
        friends: &Arc<MemoryFriendStore>,
        users: &Arc<MemoryUserStore>,
    ) -> FriendshipView<MemoryFriendStore, MemoryUserStore> {
        FriendshipView::with_dependencies(friends.clone(), users.clone())
    }

    #[actix_web::test]
    async fn partitions_relationships_by_status_and_direction() {
        let fx = fixture();
        let view = view_of(&fx.friends, &fx.users);

        let alice = fx.users.add_user("alice", "Alice", "Archer");
        let bob = fx.users.add_user("bob", "Bob", "Baker");
        let carol = fx.users.add_user("carol", "Carol", "Clark");
        let dave = fx.users.add_user("dave", "Dave", "Drake");

        // alice–bob accepted, alice→carol pending, dave→alice pending
        let ab = fx.service.send_friend_request(alice, bob).await.unwrap();
        fx.service.accept_friend_request(bob, ab.id).await.unwrap();
        fx.service.send_friend_request(alice, carol).await.unwrap();
        fx.service.send_friend_request(dave, alice).await.unwrap();

        let list = view.friends_list(alice).await.unwrap();

        assert_eq!(list.friends.len(), 1);
        assert_eq!(list.friends[0].user.id, bob);
        assert_eq!(list.outgoing.len(), 1);
        assert_eq!(list.outgoing[0].user.id, carol);
        assert_eq!(list.incoming.len(), 1);
        assert_eq!(list.incoming[0].user.id, dave);

        // never the caller, never a duplicate peer
        let mut seen: Vec<Uuid> = list
            .friends
            .iter()
            .chain(&list.outgoing)
            .chain(&list.incoming)
            .map(|e| e.user.id)
            .collect();
        assert!(!seen.contains(&alice));
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[actix_web::test]
    async fn the_other_party_sees_the_mirror_view() {
        let fx = fixture();
        let view = view_of(&fx.friends, &fx.users);

        let alice = fx.users.add_user("alice", "Alice", "Archer");
        let bob = fx.users.add_user("bob", "Bob", "Baker");

        let request = fx.service.send_friend_request(alice, bob).await.unwrap();

        let bob_list = view.friends_list(bob).await.unwrap();
        assert_eq!(bob_list.incoming.len(), 1);
        assert_eq!(bob_list.incoming[0].friendship_id, request.id);
        assert_eq!(bob_list.incoming[0].user.id, alice);
        assert!(bob_list.outgoing.is_empty());
        assert!(bob_list.friends.is_empty());
    }

    #[actix_web::test]
    async fn canceled_requests_vanish_from_both_sides() {
        let fx = fixture();
        let view = view_of(&fx.friends, &fx.users);

        let alice = fx.users.add_user("alice", "Alice", "Archer");
        let bob = fx.users.add_user("bob", "Bob", "Baker");

        let request = fx.service.send_friend_request(alice, bob).await.unwrap();
        fx.service.cancel_friend_request(alice, request.id).await.unwrap();

        let alice_list = view.friends_list(alice).await.unwrap();
        let bob_list = view.friends_list(bob).await.unwrap();
        assert!(alice_list.outgoing.is_empty());
        assert!(bob_list.incoming.is_empty());
    }

    #[actix_web::test]
    async fn removed_friendships_vanish_from_both_sides() {
        let fx = fixture();
        let view = view_of(&fx.friends, &fx.users);

        let alice = fx.users.add_user("alice", "Alice", "Archer");
        let bob = fx.users.add_user("bob", "Bob", "Baker");

        let request = fx.service.send_friend_request(alice, bob).await.unwrap();
        fx.service.accept_friend_request(bob, request.id).await.unwrap();
        fx.service.remove_friend(alice, request.id).await.unwrap();

        assert!(view.friends_list(alice).await.unwrap().friends.is_empty());
        assert!(view.friends_list(bob).await.unwrap().friends.is_empty());
    }

    #[actix_web::test]
    async fn friend_entries_carry_the_peer_presence_flag() {
        let fx = fixture();
        let view = view_of(&fx.friends, &fx.users);

        let alice = fx.users.add_user("alice", "Alice", "Archer");
        let bob = fx.users.add_user("bob", "Bob", "Baker");

        let request = fx.service.send_friend_request(alice, bob).await.unwrap();
        fx.service.accept_friend_request(bob, request.id).await.unwrap();
        fx.users.set_presence(&bob, true).await.unwrap();

        let list = view.friends_list(alice).await.unwrap();
        assert!(list.friends[0].user.is_online);
    }

    #[actix_web::test]
    async fn search_excludes_the_caller_and_matches_substrings() {
        let fx = fixture();
        let view = view_of(&fx.friends, &fx.users);

        let alice = fx.users.add_user("alice", "Alice", "Archer");
        let bob = fx.users.add_user("bobby", "Bob", "Archer");
        fx.users.add_user("carol", "Carol", "Clark");

        let results = view.search_users(alice, Some("archer".to_string())).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, bob);
    }

    #[actix_web::test]
    async fn empty_query_yields_an_empty_result() {
        let fx = fixture();
        let view = view_of(&fx.friends, &fx.users);
        let alice = fx.users.add_user("alice", "Alice", "Archer");

        assert!(view.search_users(alice, None).await.unwrap().is_empty());
        assert!(view.search_users(alice, Some(String::new())).await.unwrap().is_empty());
        assert!(view.search_users(alice, Some("   ".to_string())).await.unwrap().is_empty());
    }
}
