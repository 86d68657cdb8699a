use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    http::header,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{RedisCache, connect_database},
    middlewares::{authentication, authorization},
    modules::{
        friend::{
            repository_pg::FriendshipRepositoryPg, service::FriendshipService,
            view::FriendshipView,
        },
        notify::{BroadcastSink, NotificationSink},
        presence::service::PresenceService,
        user::{repository_pg::UserRepositoryPg, schema::UserRole, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let redis_pool =
        RedisCache::new().await.map_err(|_| std::io::Error::other("Redis connection error"))?;

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let friend_repo = Arc::new(FriendshipRepositoryPg::new(db_pool.clone()));

    // a real-time transport subscribes to this sink and pushes the events
    // to connected peers
    let fanout: Arc<dyn NotificationSink> = Arc::new(BroadcastSink::new(256));

    let user_service =
        UserService::with_dependencies(user_repo.clone(), Arc::new(redis_pool.clone()));
    let friend_service = FriendshipService::with_dependencies(
        friend_repo.clone(),
        user_repo.clone(),
        fanout.clone(),
    );
    let friend_view = FriendshipView::with_dependencies(friend_repo.clone(), user_repo.clone());
    let presence_service = PresenceService::with_dependencies(user_repo.clone(), fanout.clone());

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(friend_service.clone()))
            .app_data(web::Data::new(friend_view.clone()))
            .app_data(web::Data::new(presence_service.clone()))
            .service(health_check)
            .service(
                web::scope("/api").configure(modules::user::route::public_api_configure).service(
                    web::scope("")
                        .wrap(from_fn(authorization(vec![UserRole::User, UserRole::Admin])))
                        .wrap(from_fn(authentication))
                        .configure(modules::user::route::configure)
                        .configure(modules::friend::route::configure)
                        .configure(modules::presence::route::configure),
                ),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
