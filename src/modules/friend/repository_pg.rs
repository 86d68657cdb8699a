use uuid::Uuid;

use crate::{
    api::error,
    modules::friend::{
        model::FriendPeerRow,
        repository::FriendshipRepository,
        schema::{FriendshipEntity, FriendshipStatus},
    },
};

#[derive(Clone)]
pub struct FriendshipRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendshipRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendshipRepositoryPg {
    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::ServiceError> {
        let friendship =
            sqlx::query_as::<_, FriendshipEntity>("SELECT * FROM friendships WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(friendship)
    }

    async fn find_by_pair(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::ServiceError> {
        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            r#"
            SELECT *
            FROM friendships
            WHERE
                (requester_id = $1 AND receiver_id = $2)
            OR (requester_id = $2 AND receiver_id = $1)
            "#,
        )
        .bind(user_id_a)
        .bind(user_id_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn create_pending(
        &self,
        requester_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendshipEntity, error::ServiceError> {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            r#"
            INSERT INTO friendships (id, requester_id, receiver_id, status)
            VALUES ($1, $2, $3, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(requester_id)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn update_status(
        &self,
        id: &Uuid,
        from: FriendshipStatus,
        to: FriendshipStatus,
    ) -> Result<Option<FriendshipEntity>, error::ServiceError> {
        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            r#"
            UPDATE friendships
            SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn delete_in_status(
        &self,
        id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<bool, error::ServiceError> {
        let rows = sqlx::query("DELETE FROM friendships WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }

    async fn list_accepted(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendPeerRow>, error::ServiceError> {
        let rows = sqlx::query_as::<_, FriendPeerRow>(
            r#"
            SELECT
                f.id AS friendship_id,
                u.id AS user_id,
                u.username,
                u.first_name,
                u.last_name,
                u.avatar_url,
                u.is_online,
                f.created_at
            FROM friendships f
            JOIN users u
                ON u.id = CASE
                    WHEN f.requester_id = $1 THEN f.receiver_id
                    ELSE f.requester_id
                END
            WHERE f.status = 'ACCEPTED'
            AND (f.requester_id = $1 OR f.receiver_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_pending_sent(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendPeerRow>, error::ServiceError> {
        let rows = sqlx::query_as::<_, FriendPeerRow>(
            r#"
            SELECT
                f.id AS friendship_id,
                u.id AS user_id,
                u.username,
                u.first_name,
                u.last_name,
                u.avatar_url,
                u.is_online,
                f.created_at
            FROM friendships f
            JOIN users u
                ON u.id = f.receiver_id
            WHERE f.status = 'PENDING'
            AND f.requester_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_pending_received(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendPeerRow>, error::ServiceError> {
        let rows = sqlx::query_as::<_, FriendPeerRow>(
            r#"
            SELECT
                f.id AS friendship_id,
                u.id AS user_id,
                u.username,
                u.first_name,
                u.last_name,
                u.avatar_url,
                u.is_online,
                f.created_at
            FROM friendships f
            JOIN users u
                ON u.id = f.requester_id
            WHERE f.status = 'PENDING'
            AND f.receiver_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
