use actix_web::{put, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        presence::{
            model::{PresenceResponse, StatusUpdateBody},
            service::PresenceService,
        },
        user::repository_pg::UserRepositoryPg,
    },
};

pub type PresenceSvc = PresenceService<UserRepositoryPg>;

#[put("/status")]
pub async fn update_status(
    presence_service: web::Data<PresenceSvc>,
    body: web::Json<StatusUpdateBody>,
    req: HttpRequest,
) -> Result<success::Success<PresenceResponse>, error::ApiError> {
    let user_id = get_claims(&req)?.sub;
    let presence = presence_service.set_online(user_id, body.is_online).await?;

    Ok(success::Success::ok(presence).message("Status updated successfully"))
}
