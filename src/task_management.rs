// src/task_management.rs

use std::collections::HashMap;

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::models::{Priority, Task, TaskKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Epoch millis; 0 or absent means no due date.
    #[serde(default)]
    pub due_date: i64,
    pub priority: Priority,
    pub group_id: Option<String>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub is_completed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneesRequest {
    pub assigned_to: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub is_confirmed: bool,
}

fn current_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<String>().cloned()
}

// POST /tasks
pub async fn create_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateTaskRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    // An absent or empty groupId makes a personal task.
    let kind = match payload.group_id.as_deref() {
        Some(group_id) if !group_id.is_empty() => TaskKind::Group {
            group_id: group_id.to_string(),
            assigned_to: payload.assigned_to.clone(),
        },
        _ => TaskKind::Personal,
    };
    let task = Task {
        id: String::new(),
        title: payload.title.clone(),
        description: payload.description.clone(),
        is_completed: false,
        created_at: Utc::now().timestamp_millis(),
        due_date: payload.due_date,
        priority: payload.priority,
        user_id: current,
        kind,
        labels: payload.labels.clone(),
        completion_confirmations: HashMap::new(),
    };

    match data.task_service.create_task(task).await {
        Ok(created) => HttpResponse::Ok().json(created),
        Err(e) => e.http_response(),
    }
}

// GET /tasks/{task_id}
pub async fn get_task(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match data.tasks.get_by_id(&path).await {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e) => e.http_response(),
    }
}

// GET /tasks/user/{user_id}
pub async fn get_user_tasks(
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
        return HttpResponse::Unauthorized().body("Cannot access another user's tasks");
    }

    match data.tasks.get_for_user(&user_id).await {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => e.http_response(),
    }
}

// GET /tasks/assigned/{user_id}
pub async fn get_assigned_tasks(
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
        return HttpResponse::Unauthorized().body("Cannot access another user's tasks");
    }

    match data.tasks.get_assigned_to(&user_id).await {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => e.http_response(),
    }
}

// GET /tasks/group/{group_id}
pub async fn get_group_tasks(
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

    match data.tasks.get_for_group(&group.id).await {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => e.http_response(),
    }
}

// PUT /tasks/{task_id}
// Full-document overwrite; the id in the path wins over the body.
pub async fn update_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<Task>,
) -> impl Responder {
    let mut task = payload.into_inner();
    task.id = path.into_inner();

    match data.task_service.update_task(task.clone()).await {
        Ok(()) => HttpResponse::Ok().json(task),
        Err(e) => e.http_response(),
    }
}

// DELETE /tasks/{task_id}
pub async fn delete_task(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match data.task_service.delete_task(&path).await {
        Ok(()) => HttpResponse::Ok().body("Task deleted"),
        Err(e) => e.http_response(),
    }
}

// PUT /tasks/{task_id}/completion
pub async fn set_completion(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<CompletionRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    match data
        .task_service
        .set_completed(&path, payload.is_completed, &current)
        .await
    {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e) => e.http_response(),
    }
}

// PUT /tasks/{task_id}/assignees
// Works without an authenticated caller: the reassignment still commits,
// only the "task assigned" notices are skipped.
pub async fn reassign_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<AssigneesRequest>,
) -> impl Responder {
    let acting_user = current_user(&req);

    match data
        .task_service
        .reassign(&path, payload.assigned_to.clone(), acting_user.as_deref())
        .await
    {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e) => e.http_response(),
    }
}

// PUT /tasks/{task_id}/confirmations
pub async fn confirm_completion(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ConfirmationRequest>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    match data
        .task_service
        .confirm_completion(&path, &current, payload.is_confirmed)
        .await
    {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e) => e.http_response(),
    }
}

// POST /tasks/{task_id}/confirmations/reset
pub async fn reset_confirmations(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    match data.task_service.reset_confirmations(&path).await {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e) => e.http_response(),
    }
}
