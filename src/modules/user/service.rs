use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::configs::RedisCache;
use crate::ENV;

use crate::modules::user::model::{
    InsertUser, SignInModel, SignUpModel, UpdateProfile, UpdateProfileModel, UserResponse,
};
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::UserRole;
use crate::utils::{hash_password, verify_password, Claims};

fn session_key(jti: &Uuid) -> String {
    format!("refresh_token:{jti}")
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<RedisCache>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<RedisCache>,
    ) -> Self {
        UserService { repo, sessions }
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<Uuid, error::ServiceError> {
        let hash_password = hash_password(&user.password)?;

        let new_user = InsertUser {
            bio: format!("Hi, I'm {}", user.username),
            username: user.username,
            email: user.email,
            hash_password,
            first_name: user.first_name,
            last_name: user.last_name,
        };

        // username/email uniqueness is enforced by the schema; a violation
        // surfaces here as a Conflict
        let user_id = self.repo.create(&new_user).await?;
        log::info!("Registered user {}", user_id);
        Ok(user_id)
    }

    /// Verify credentials and issue an access/refresh token pair. Presence
    /// is deliberately not touched: a user keeps their last known state
    /// across sessions.
    pub async fn sign_in(&self, user: SignInModel) -> Result<(String, String), error::ServiceError> {
        let user_entity = self
            .repo
            .find_by_username(&user.username)
            .await?
            .ok_or_else(|| error::ServiceError::unauthorized("Invalid username or password"))?;

        let valid = verify_password(&user_entity.hash_password, &user.password)?;
        if !valid {
            return Err(error::ServiceError::unauthorized("Invalid username or password"));
        }

        self.issue_tokens(&user_entity.id, &user_entity.role).await
    }

    pub async fn sign_out(&self, refresh_token: Option<String>) -> Result<(), error::ServiceError> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        if let Ok(claims) = Claims::decode(&token, ENV.jwt_secret.as_ref()) {
            if let Some(jti) = claims.jti {
                self.sessions.delete(&session_key(&jti)).await?;
            }
        }

        Ok(())
    }

    pub async fn refresh(
        &self,
        refresh_token: Option<String>,
    ) -> Result<(String, String), error::ServiceError> {
        let token = refresh_token
            .ok_or_else(|| error::ServiceError::unauthorized("Missing refresh token"))?;

        let claims = Claims::decode(&token, ENV.jwt_secret.as_ref())
            .map_err(|_| error::ServiceError::unauthorized("Invalid refresh token"))?;
        let jti =
            claims.jti.ok_or_else(|| error::ServiceError::unauthorized("Invalid refresh token"))?;

        let session: Option<Uuid> = self.sessions.get(&session_key(&jti)).await?;
        if session != Some(claims.sub) {
            return Err(error::ServiceError::unauthorized("Refresh token revoked"));
        }

        // rotate: the old jti must not stay valid
        self.sessions.delete(&session_key(&jti)).await?;
        self.issue_tokens(&claims.sub, &claims.role).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::ServiceError> {
        let user = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| error::ServiceError::not_found("User not found"))?;

        Ok(UserResponse::from(user))
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        update: UpdateProfileModel,
    ) -> Result<UserResponse, error::ServiceError> {
        // empty strings are treated as absent; only provided, non-empty
        // fields are applied
        let bio = update.bio.filter(|s| !s.is_empty());
        let avatar_url = update.avatar_url.filter(|s| !s.is_empty());
        let password = update.password.filter(|s| !s.is_empty());

        if bio.is_none() && avatar_url.is_none() && password.is_none() {
            return Err(error::ServiceError::bad_request("No fields to update"));
        }

        let hash_password = match password {
            Some(p) => Some(hash_password(&p)?),
            None => None,
        };

        let updated = self
            .repo
            .update_profile(&id, &UpdateProfile { bio, avatar_url, hash_password })
            .await?;

        Ok(UserResponse::from(updated))
    }

    async fn issue_tokens(
        &self,
        user_id: &Uuid,
        role: &UserRole,
    ) -> Result<(String, String), error::ServiceError> {
        let access_token = Claims::new(user_id, role, ENV.access_token_expiration)
            .encode(ENV.jwt_secret.as_ref())?;

        let jti = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let refresh_token = Claims::new(user_id, role, ENV.refresh_token_expiration)
            .with_jti(jti)
            .encode(ENV.jwt_secret.as_ref())?;

        self.sessions
            .set(&session_key(&jti), user_id, ENV.refresh_token_expiration)
            .await?;

        Ok((access_token, refresh_token))
    }
}
