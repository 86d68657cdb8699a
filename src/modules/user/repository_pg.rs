use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateProfile},
        repository::UserRepository,
        schema::UserEntity,
    },
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::ServiceError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::ServiceError> {
        let user =
            sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE lower(username) = lower($1)")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::ServiceError> {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, hash_password, first_name, last_name, bio)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.hash_password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_profile(
        &self,
        id: &Uuid,
        update: &UpdateProfile,
    ) -> Result<UserEntity, error::ServiceError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET
                bio           = COALESCE($2, bio),
                avatar_url    = COALESCE($3, avatar_url),
                hash_password = COALESCE($4, hash_password),
                updated_at    = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.bio)
        .bind(&update.avatar_url)
        .bind(&update.hash_password)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| error::ServiceError::not_found("User not found"))?;

        Ok(user)
    }

    async fn search_users(
        &self,
        query: &str,
        exclude: &Uuid,
        limit: i32,
    ) -> Result<Vec<UserEntity>, error::ServiceError> {
        let search_pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let users = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users
            WHERE id <> $2
            AND (
                lower(username) LIKE lower($1)
                OR lower(first_name) LIKE lower($1)
                OR lower(last_name) LIKE lower($1)
                OR lower(email) LIKE lower($1)
            )
            ORDER BY username
            LIMIT $3
            "#,
        )
        .bind(&search_pattern)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn set_presence(
        &self,
        id: &Uuid,
        online: bool,
    ) -> Result<Option<bool>, error::ServiceError> {
        // Single-statement update: the returned flag is the persisted one.
        let persisted = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE users
            SET is_online = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING is_online
            "#,
        )
        .bind(id)
        .bind(online)
        .fetch_optional(&self.pool)
        .await?;

        Ok(persisted)
    }
}
