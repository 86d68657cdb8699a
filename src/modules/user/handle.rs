use actix_web::{
    cookie::{time, Cookie},
    get, patch, post, web, HttpRequest,
};
use uuid::Uuid;

use crate::modules::user::{model, service::UserService};
use crate::{
    api::{error, success},
    middlewares::get_claims,
    utils::ValidatedJson,
    ENV,
};

fn refresh_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build("refresh_token", token)
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(max_age_secs))
        .finish()
}

#[post("/signup")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignUpModel>,
) -> Result<success::Success<model::SignUpResponse>, error::ApiError> {
    let user_id = user_service.sign_up(user_data.0).await?;
    Ok(success::Success::created(model::SignUpResponse { id: user_id })
        .message("Signup successful"))
}

#[post("/signin")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::ApiError> {
    let (access_token, refresh_token) = user_service.sign_in(user_data.0).await?;

    Ok(success::Success::ok(model::SignInResponse { access_token })
        .message("Signin successful")
        .cookie(refresh_cookie(refresh_token, ENV.refresh_token_expiration as i64)))
}

#[get("/signout")]
pub async fn sign_out(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::ApiError> {
    let refresh_token = req.cookie("refresh_token").map(|c| c.value().to_string());
    user_service.sign_out(refresh_token).await?;

    let mut expired = refresh_cookie(String::new(), 0);
    expired.set_expires(time::OffsetDateTime::UNIX_EPOCH);

    Ok(success::Success::no_content().cookie(expired))
}

#[post("/refresh")]
pub async fn refresh(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::SignInResponse>, error::ApiError> {
    let refresh_token = req.cookie("refresh_token").map(|c| c.value().to_string());
    let (access_token, refresh_token) = user_service.refresh(refresh_token).await?;

    Ok(success::Success::ok(model::SignInResponse { access_token })
        .message("Refresh successful")
        .cookie(refresh_cookie(refresh_token, ENV.refresh_token_expiration as i64)))
}

#[get("/profile")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::ApiError> {
    let id = get_claims(&req)?.sub;
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(user).message("Profile retrieved successfully"))
}

#[patch("/profile")]
pub async fn update_profile(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::UpdateProfileModel>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::ApiError> {
    let id = get_claims(&req)?.sub;
    let user = user_service.update_profile(id, user_data.0).await?;
    Ok(success::Success::ok(user).message("Profile updated successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<model::UserResponse>, error::ApiError> {
    let user = user_service.get_by_id(user_id.into_inner()).await?;
    Ok(success::Success::ok(user).message("User retrieved successfully"))
}
