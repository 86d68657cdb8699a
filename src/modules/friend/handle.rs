use actix_web::{delete, get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::{
            model::{FriendListResponse, FriendRequestBody, FriendshipResponse, SearchUsersQuery},
            repository_pg::FriendshipRepositoryPg,
            service::FriendshipService,
            view::FriendshipView,
        },
        user::{model::UserSummary, repository_pg::UserRepositoryPg},
    },
    utils::ValidatedQuery,
};

pub type FriendshipSvc = FriendshipService<FriendshipRepositoryPg, UserRepositoryPg>;
pub type FriendshipViewSvc = FriendshipView<FriendshipRepositoryPg, UserRepositoryPg>;

#[post("/requests")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendshipSvc>,
    body: web::Json<FriendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipResponse>, error::ApiError> {
    let sender_id = get_claims(&req)?.sub;
    let friendship = friend_service.send_friend_request(sender_id, body.receiver_id).await?;

    Ok(success::Success::created(friendship).message("Friend request sent successfully"))
}

#[post("/requests/{request_id}/accept")]
pub async fn accept_friend_request(
    friend_service: web::Data<FriendshipSvc>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipResponse>, error::ApiError> {
    let receiver_id = get_claims(&req)?.sub;
    let friendship = friend_service.accept_friend_request(receiver_id, *request_id).await?;

    Ok(success::Success::ok(friendship).message("Friend request accepted successfully"))
}

#[post("/requests/{request_id}/decline")]
pub async fn decline_friend_request(
    friend_service: web::Data<FriendshipSvc>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipResponse>, error::ApiError> {
    let receiver_id = get_claims(&req)?.sub;
    let friendship = friend_service.decline_friend_request(receiver_id, *request_id).await?;

    Ok(success::Success::ok(friendship).message("Friend request declined"))
}

#[delete("/requests/{request_id}")]
pub async fn cancel_friend_request(
    friend_service: web::Data<FriendshipSvc>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::ApiError> {
    let requester_id = get_claims(&req)?.sub;
    friend_service.cancel_friend_request(requester_id, *request_id).await?;
    Ok(success::Success::no_content())
}

#[delete("/{friendship_id}")]
pub async fn remove_friend(
    friend_service: web::Data<FriendshipSvc>,
    friendship_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::ApiError> {
    let user_id = get_claims(&req)?.sub;
    friend_service.remove_friend(user_id, *friendship_id).await?;
    Ok(success::Success::no_content())
}

#[get("/")]
pub async fn list_friends(
    friend_view: web::Data<FriendshipViewSvc>,
    req: HttpRequest,
) -> Result<success::Success<FriendListResponse>, error::ApiError> {
    let user_id = get_claims(&req)?.sub;
    let list = friend_view.friends_list(user_id).await?;

    Ok(success::Success::ok(list).message("Friends retrieved successfully"))
}

#[get("/search")]
pub async fn search_users(
    friend_view: web::Data<FriendshipViewSvc>,
    query: ValidatedQuery<SearchUsersQuery>,
    req: HttpRequest,
) -> Result<success::Success<Vec<UserSummary>>, error::ApiError> {
    let caller_id = get_claims(&req)?.sub;
    let users = friend_view.search_users(caller_id, query.0.q).await?;

    Ok(success::Success::ok(users).message("Users retrieved successfully"))
}
