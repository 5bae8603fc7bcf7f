use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};

use crate::app_state::AppState;

fn current_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<String>().cloned()
}

// GET /notifications/{user_id}
// Newest first.
pub async fn get_notifications(
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
        return HttpResponse::Unauthorized().body("Cannot access another user's notifications");
    }

    match data.notifications.get_for_user(&user_id).await {
        Ok(notifications) => HttpResponse::Ok().json(notifications),
        Err(e) => e.http_response(),
    }
}

// PUT /notifications/{notification_id}/read
pub async fn mark_read(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    let mut notification = match data.notifications.get_by_id(&path).await {
        Ok(notification) => notification,
        Err(e) => return e.http_response(),
    };
    if notification.user_id != current {
        return HttpResponse::Unauthorized().body("Cannot modify another user's notification");
    }

    match data.notifications.mark_read(&notification.id).await {
        Ok(()) => {
            notification.is_read = true;
            HttpResponse::Ok().json(notification)
        }
        Err(e) => e.http_response(),
    }
}

// DELETE /notifications/{notification_id}
pub async fn delete_notification(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    let notification = match data.notifications.get_by_id(&path).await {
        Ok(notification) => notification,
        Err(e) => return e.http_response(),
    };
    if notification.user_id != current {
        return HttpResponse::Unauthorized().body("Cannot delete another user's notification");
    }

    match data.notifications.delete(&notification.id).await {
        Ok(()) => HttpResponse::Ok().body("Notification deleted"),
        Err(e) => e.http_response(),
    }
}
