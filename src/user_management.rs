use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct IdsQuery {
    /// Comma-separated document ids.
    pub ids: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

// GET /users/{user_id}
pub async fn get_user(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    match data.users.get_by_id(&user_id).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(e) => e.http_response(),
    }
}

// GET /users?ids=a,b,c
// Resolves what it can; unknown ids are skipped, not an error.
pub async fn get_users_batch(
    data: web::Data<AppState>,
    query: web::Query<IdsQuery>,
) -> impl Responder {
    let ids: Vec<String> = query
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    match data.users.get_by_ids(&ids).await {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(e) => e.http_response(),
    }
}

// PUT /users/{user_id}
// Users may only edit their own profile, and only the name is editable.
pub async fn update_profile(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let current_user = if let Some(id) = req.extensions().get::<String>() {
        id.clone()
    } else {
        return HttpResponse::Unauthorized().body("Unauthorized");
    };

    let user_id = path.into_inner();
    if current_user != user_id {
        return HttpResponse::Unauthorized().body("Cannot edit another user's profile");
    }
    if payload.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Name cannot be empty");
    }

    let mut user = match data.users.get_by_id(&user_id).await {
        Ok(user) => user,
        Err(e) => return e.http_response(),
    };
    user.name = payload.name.clone();

    match data.users.update(&user).await {
        Ok(()) => HttpResponse::Ok().json(user),
        Err(e) => e.http_response(),
    }
}
