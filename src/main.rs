// src/main.rs

mod app_state;
mod auth;
mod config;
mod error;
mod group_management;
mod group_service;
mod label_management;
mod models;
mod notifications;
mod overview;
mod repos;
mod store;
mod task_management;
mod task_service;
mod user_management;

use std::env;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http,
    middleware::Logger,
    web, App, Error, HttpMessage, HttpResponse, HttpServer,
};
use env_logger::Env;
use futures_util::future::{ok, Ready};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::app_state::AppState;
use crate::auth::{change_password, delete_account, login, signup, Claims};
use crate::group_management::{
    add_member, change_role, create_group, delete_group, get_group, get_members,
    get_user_groups, remove_member, update_group,
};
use crate::label_management::{
    create_label, delete_label, get_labels_batch, get_shared_labels, get_user_labels,
    update_label,
};
use crate::notifications::{delete_notification, get_notifications, mark_read};
use crate::overview::get_overview;
use crate::store::mongo::MongoStore;
use crate::task_management::{
    confirm_completion, create_task, delete_task, get_assigned_tasks, get_group_tasks,
    get_task, get_user_tasks, reassign_task, reset_confirmations, set_completion,
    update_task,
};
use crate::user_management::{get_user, get_users_batch, update_profile};

#[derive(Debug)]
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware { service })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        // Extract "Bearer <token>" from the Authorization header if present
        if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header.to_str() {
                if auth_str.starts_with("Bearer ") {
                    let token = auth_str.trim_start_matches("Bearer ").trim().to_string();
                    match verify_token(&token) {
                        Ok(user_id) => {
                            // Insert user_id as a string extension
                            req.extensions_mut().insert(user_id);
                        }
                        Err(e) => {
                            let (req_parts, _payload) = req.into_parts();
                            let resp = HttpResponse::Unauthorized()
                                .body(format!("Invalid token: {}", e))
                                .map_into_boxed_body();
                            let srv_resp = ServiceResponse::new(req_parts, resp);
                            return Box::pin(async move { Ok(srv_resp) });
                        }
                    }
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

fn verify_token(token: &str) -> Result<String, String> {
    let secret = env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string());
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    ) {
        Ok(token_data) => Ok(token_data.claims.sub),
        Err(e) => Err(format!("Token decode error: {}", e)),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let frontend_origin = config.frontend_origin.clone();
    let bind_addr = config.bind_addr.clone();

    let store = MongoStore::init(&config.mongo_uri, &config.database_name).await;
    let state = AppState::new(store, config);

    println!("Server running at http://{}", bind_addr);
    println!("Allowed CORS Origin: {}", frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication)
            .app_data(web::Data::new(state.clone()))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(signup))
                    .route("/login", web::post().to(login))
                    .route("/password", web::put().to(change_password))
                    .route("/account", web::delete().to(delete_account)),
            )
            // USERS
            .service(
                web::scope("/users")
                    .route("", web::get().to(get_users_batch))
                    .route("/{user_id}", web::get().to(get_user))
                    .route("/{user_id}", web::put().to(update_profile)),
            )
            // GROUPS
            .service(
                web::scope("/groups")
                    .route("", web::post().to(create_group))
                    .route("/user_groups/{user_id}", web::get().to(get_user_groups))
                    .service(
                        web::scope("/{group_id}")
                            .route("", web::get().to(get_group))
                            .route("", web::put().to(update_group))
                            .route("", web::delete().to(delete_group))
                            .route("/roles", web::put().to(change_role))
                            .service(
                                web::scope("/members")
                                    .route("", web::get().to(get_members))
                                    .route("", web::post().to(add_member))
                                    .route("", web::delete().to(remove_member)),
                            ),
                    ),
            )
            // TASKS
            .service(
                web::scope("/tasks")
                    .route("", web::post().to(create_task))
                    .route("/user/{user_id}", web::get().to(get_user_tasks))
                    .route("/assigned/{user_id}", web::get().to(get_assigned_tasks))
                    .route("/group/{group_id}", web::get().to(get_group_tasks))
                    .service(
                        web::scope("/{task_id}")
                            .route("", web::get().to(get_task))
                            .route("", web::put().to(update_task))
                            .route("", web::delete().to(delete_task))
                            .route("/completion", web::put().to(set_completion))
                            .route("/assignees", web::put().to(reassign_task))
                            .route("/confirmations", web::put().to(confirm_completion))
                            .route("/confirmations/reset", web::post().to(reset_confirmations)),
                    ),
            )
            // LABELS
            .service(
                web::scope("/labels")
                    .route("", web::post().to(create_label))
                    .route("", web::get().to(get_labels_batch))
                    .route("/user/{user_id}", web::get().to(get_user_labels))
                    .route("/group/{group_id}/shared", web::get().to(get_shared_labels))
                    .route("/{label_id}", web::put().to(update_label))
                    .route("/{label_id}", web::delete().to(delete_label)),
            )
            // NOTIFICATIONS
            .service(
                web::scope("/notifications")
                    .route("/{user_id}", web::get().to(get_notifications))
                    .route("/{notification_id}/read", web::put().to(mark_read))
                    .route("/{notification_id}", web::delete().to(delete_notification)),
            )
            // OVERVIEW
            .service(web::scope("/overview").route("/{user_id}", web::get().to(get_overview)))
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}
