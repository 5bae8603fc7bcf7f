// src/group_management.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::models::{Group, Role};

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub user_id: String,
    pub role: Role,
}

/// A group member's profile joined with their role in this group.
#[derive(Debug, Serialize)]
pub struct MemberInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

fn current_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<String>().cloned()
}

/// Membership gate shared by the read endpoints.
fn member_gate(group: &Group, user_id: &str) -> Result<(), HttpResponse> {
    if group.is_member(user_id) {
        Ok(())
    } else {
        Err(HttpResponse::Unauthorized().body("Not a member of this group"))
    }
}

// POST /groups
pub async fn create_group(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateGroupRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    match data
        .group_service
        .create_group(&payload.name, payload.description.clone(), &current)
        .await
    {
        Ok(group) => HttpResponse::Ok().json(group),
        Err(e) => e.http_response(),
    }
}

// GET /groups/user_groups/{user_id}
pub async fn get_user_groups(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let user_id = path.into_inner();
    if current != user_id {
        return HttpResponse::Unauthorized().body("Cannot access another user's groups");
    }

    match data.groups.get_for_member(&user_id).await {
        Ok(groups) => HttpResponse::Ok().json(groups),
        Err(e) => e.http_response(),
    }
}

// GET /groups/{group_id}
pub async fn get_group(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    let group = match data.groups.get_by_id(&path).await {
        Ok(group) => group,
        Err(e) => return e.http_response(),
    };
    if let Err(resp) = member_gate(&group, &current) {
        return resp;
    }
    HttpResponse::Ok().json(group)
}

// PUT /groups/{group_id}
pub async fn update_group(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateGroupRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    match data
        .group_service
        .rename_group(&path, &payload.name, &current)
        .await
    {
        Ok(group) => HttpResponse::Ok().json(group),
        Err(e) => e.http_response(),
    }
}

// DELETE /groups/{group_id}
pub async fn delete_group(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    match data.group_service.delete_group(&path, &current).await {
        Ok(()) => HttpResponse::Ok().body("Group deleted"),
        Err(e) => e.http_response(),
    }
}

// GET /groups/{group_id}/members
// Members' profiles joined with their group role. Profiles that fail to
// resolve are skipped, matching the batch-lookup semantics.
pub async fn get_members(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    let group = match data.groups.get_by_id(&path).await {
        Ok(group) => group,
        Err(e) => return e.http_response(),
    };
    if let Err(resp) = member_gate(&group, &current) {
        return resp;
    }

    match data.users.get_by_ids(&group.members).await {
        Ok(users) => {
            let members: Vec<MemberInfo> = users
                .into_iter()
                .map(|user| MemberInfo {
                    role: group.member_role(&user.id),
                    id: user.id,
                    name: user.name,
                    email: user.email,
                })
                .collect();
            HttpResponse::Ok().json(members)
        }
        Err(e) => e.http_response(),
    }
}

// POST /groups/{group_id}/members
pub async fn add_member(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<MemberRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    match data
        .group_service
        .add_member(&path, &payload.user_id, &current)
        .await
    {
        Ok(group) => HttpResponse::Ok().json(group),
        Err(e) => e.http_response(),
    }
}

// DELETE /groups/{group_id}/members
pub async fn remove_member(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<MemberRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    match data
        .group_service
        .remove_member(&path, &payload.user_id, &current)
        .await
    {
        Ok(group) => HttpResponse::Ok().json(group),
        Err(e) => e.http_response(),
    }
}

// PUT /groups/{group_id}/roles
pub async fn change_role(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ChangeRoleRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    match data
        .group_service
        .change_role(&path, &payload.user_id, payload.role, &current)
        .await
    {
        Ok(group) => HttpResponse::Ok().json(group),
        Err(e) => e.http_response(),
    }
}
