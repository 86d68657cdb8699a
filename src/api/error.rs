use actix_web::{
    http::StatusCode,
    HttpResponse, ResponseError,
};
use deadpool_redis::{redis::RedisError, CreatePoolError, PoolError};
use std::borrow::Cow;

/// Errors returned to HTTP clients. Every variant maps to a stable status
/// code and a user-facing message; internal detail never leaves the server.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Forbidden: {0}")]
    Forbidden(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Internal Server Error")]
    Internal,
}

#[derive(serde::Serialize)]
struct ErrorBody {
    message: Cow<'static, str>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Internal => "Internal Server Error".into(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { message })
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(msg.into())
    }
}

/// Errors raised inside services and repositories. Domain variants carry a
/// message that survives to the client; infrastructure variants are logged
/// and collapse to a 500 at the HTTP boundary.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("JWT error")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hash error")]
    Hash(#[from] argon2::password_hash::Error),
    #[error("Database error: {0}")]
    Database(Cow<'static, str>),
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    RedisPoolInit(#[from] CreatePoolError),
    #[error("Redis pool error: {0}")]
    RedisPoolGet(#[from] PoolError),
    #[error("Redis error")]
    Redis(#[from] RedisError),
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Forbidden: {0}")]
    Forbidden(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl ServiceError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::BadRequest(msg) => ApiError::BadRequest(msg),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            other => {
                log::error!("Internal server error: {:?}", other);
                ApiError::Internal
            }
        }
    }
}

/// Turn a unique-constraint name like `users_username_key` into
/// "Username already exists".
fn duplicate_message(constraint: Option<&str>) -> Cow<'static, str> {
    let Some(constraint) = constraint else {
        return "Duplicate value".into();
    };

    let field = constraint
        .trim_end_matches("_key")
        .trim_end_matches("_idx")
        .split('_')
        .next_back()
        .unwrap_or("value");

    let mut chars = field.chars();
    match chars.next() {
        Some(c) => format!("{}{} already exists", c.to_uppercase(), chars.as_str()).into(),
        None => "Duplicate value".into(),
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                // unique_violation: uniqueness lives in the schema, the
                // application-level check is only a fast path
                Some("23505") => {
                    return ServiceError::Conflict(duplicate_message(db_err.constraint()));
                }
                // foreign_key_violation
                Some("23503") => {
                    return ServiceError::not_found("Referenced resource not found");
                }
                _ => {
                    log::error!("Unhandled database error: {:?}", db_err);
                    return ServiceError::Database(db_err.message().to_string().into());
                }
            }
        }
        log::error!("{:?}", err);
        ServiceError::Internal(Box::new(err))
    }
}
