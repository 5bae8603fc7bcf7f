// src/overview.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::models::{Priority, Task};

const DAY_MILLIS: i64 = 86_400_000;

/// Per-user task statistics, computed in code after a full fetch. The
/// store is never asked for range queries.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    pub due_today: usize,
    pub overdue: usize,
}

/// Buckets tasks for the overview. `day_start`/`day_end` bound the
/// current UTC day; "due today" takes the half-open window, "overdue"
/// is anything incomplete that was due before today.
pub fn compute_overview(tasks: &[Task], day_start: i64, day_end: i64) -> Overview {
    let mut overview = Overview {
        total: tasks.len(),
        completed: 0,
        pending: 0,
        high_priority: 0,
        medium_priority: 0,
        low_priority: 0,
        due_today: 0,
        overdue: 0,
    };

    for task in tasks {
        if task.is_completed {
            overview.completed += 1;
        } else {
            overview.pending += 1;
        }

        match task.priority {
            Priority::High => overview.high_priority += 1,
            Priority::Medium => overview.medium_priority += 1,
            Priority::Low => overview.low_priority += 1,
        }

        if !task.is_completed && task.due_date > 0 {
            if task.due_date >= day_start && task.due_date < day_end {
                overview.due_today += 1;
            } else if task.due_date < day_start {
                overview.overdue += 1;
            }
        }
    }
    overview
}

// GET /overview/{user_id}
// Covers tasks the user created plus group tasks assigned to them,
// deduplicated by id.
pub async fn get_overview(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current = if let Some(id) = req.extensions().get::<String>() {
        id.clone()
    } else {
        return HttpResponse::Unauthorized().body("Unauthorized");
    };
    let user_id = path.into_inner();
    if current != user_id {
        return HttpResponse::Unauthorized().body("Cannot access another user's overview");
    }

    let mut tasks = match data.tasks.get_for_user(&user_id).await {
        Ok(tasks) => tasks,
        Err(e) => return e.http_response(),
    };
    let assigned = match data.tasks.get_assigned_to(&user_id).await {
        Ok(tasks) => tasks,
        Err(e) => return e.http_response(),
    };
    for task in assigned {
        if !tasks.iter().any(|t| t.id == task.id) {
            tasks.push(task);
        }
    }

    let now = Utc::now().timestamp_millis();
    let day_start = now - now.rem_euclid(DAY_MILLIS);
    let overview = compute_overview(&tasks, day_start, day_start + DAY_MILLIS);
    HttpResponse::Ok().json(overview)
}
