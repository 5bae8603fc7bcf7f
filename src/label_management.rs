// src/label_management.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::models::Label;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    pub name: String,
    pub color: String,
    pub group_id: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelRequest {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub is_shared: bool,
}

#[derive(Debug, Deserialize)]
pub struct IdsQuery {
    /// Comma-separated document ids.
    pub ids: String,
}

fn current_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<String>().cloned()
}

fn validate(name: &str, color: &str) -> Option<HttpResponse> {
    if name.trim().is_empty() {
        return Some(HttpResponse::BadRequest().body("Label name cannot be empty"));
    }
    if !Label::color_is_valid(color) {
        return Some(HttpResponse::BadRequest().body("Invalid color format"));
    }
    None
}

// POST /labels
pub async fn create_label(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateLabelRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    if let Some(resp) = validate(&payload.name, &payload.color) {
        return resp;
    }

    let mut label = Label {
        id: String::new(),
        name: payload.name.clone(),
        color: payload.color.clone(),
        user_id: current,
        group_id: payload.group_id.clone(),
        is_shared: payload.is_shared,
    };

    match data.labels.create(label.clone()).await {
        Ok(id) => {
            label.id = id;
            HttpResponse::Ok().json(label)
        }
        Err(e) => e.http_response(),
    }
}

// GET /labels/user/{user_id}
pub async fn get_user_labels(
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
        return HttpResponse::Unauthorized().body("Cannot access another user's labels");
    }

    match data.labels.get_for_user(&user_id).await {
        Ok(labels) => HttpResponse::Ok().json(labels),
        Err(e) => e.http_response(),
    }
}

// GET /labels/group/{group_id}/shared
pub async fn get_shared_labels(
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
    if !group.is_member(&current) {
        return HttpResponse::Unauthorized().body("Not a member of this group");
    }

    match data.labels.get_shared_for_group(&group.id).await {
        Ok(labels) => HttpResponse::Ok().json(labels),
        Err(e) => e.http_response(),
    }
}

// GET /labels?ids=a,b,c
// Unknown ids are skipped. Tasks keep label ids as weak references, so
// callers resolving a task's labels rely on exactly this behavior.
pub async fn get_labels_batch(
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

    match data.labels.get_by_ids(&ids).await {
        Ok(labels) => HttpResponse::Ok().json(labels),
        Err(e) => e.http_response(),
    }
}

// PUT /labels/{label_id}
pub async fn update_label(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateLabelRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    let mut label = match data.labels.get_by_id(&path).await {
        Ok(label) => label,
        Err(e) => return e.http_response(),
    };
    if label.user_id != current {
        return HttpResponse::Unauthorized().body("Cannot edit another user's label");
    }
    if let Some(resp) = validate(&payload.name, &payload.color) {
        return resp;
    }

    label.name = payload.name.clone();
    label.color = payload.color.clone();
    label.is_shared = payload.is_shared;

    match data.labels.update(&label).await {
        Ok(()) => HttpResponse::Ok().json(label),
        Err(e) => e.http_response(),
    }
}

// DELETE /labels/{label_id}
// Tasks referencing the label keep its id; readers drop ids that no
// longer resolve.
pub async fn delete_label(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    let label = match data.labels.get_by_id(&path).await {
        Ok(label) => label,
        Err(e) => return e.http_response(),
    };
    if label.user_id != current {
        return HttpResponse::Unauthorized().body("Cannot delete another user's label");
    }

    match data.labels.delete(&label.id).await {
        Ok(()) => HttpResponse::Ok().body("Label deleted"),
        Err(e) => e.http_response(),
    }
}
