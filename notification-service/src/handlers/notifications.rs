use super::build_payload;
use crate::services::NotificationService;
/// Notification dispatch handlers
use actix_web::{web, HttpResponse, ResponseError, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Request to send a notification to one recipient
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SendNotificationPayload {
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub category: String,
    pub icon: Option<String>,
    pub click_action: Option<String>,
    #[serde(default)]
    pub extra_data: HashMap<String, String>,
}

/// Request to send a notification to every known recipient
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BroadcastPayload {
    pub title: String,
    pub body: String,
    pub category: String,
    pub icon: Option<String>,
    pub click_action: Option<String>,
    #[serde(default)]
    pub extra_data: HashMap<String, String>,
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Send a notification to a single recipient
///
/// POST /api/v1/notifications/send
pub async fn send_notification(
    service: web::Data<Arc<NotificationService>>,
    req: web::Json<SendNotificationPayload>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();

    let payload = match build_payload(
        req.title,
        req.body,
        &req.category,
        req.icon,
        req.click_action,
        req.extra_data,
    ) {
        Ok(payload) => payload,
        Err(e) => return Ok(e.error_response()),
    };

    match service.notify(req.recipient_id, &payload).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::ok(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Send a notification to every recipient with active tokens
///
/// POST /api/v1/notifications/broadcast
pub async fn broadcast_notification(
    service: web::Data<Arc<NotificationService>>,
    req: web::Json<BroadcastPayload>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();

    let payload = match build_payload(
        req.title,
        req.body,
        &req.category,
        req.icon,
        req.click_action,
        req.extra_data,
    ) {
        Ok(payload) => payload,
        Err(e) => return Ok(e.error_response()),
    };

    match service.broadcast(&payload).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::ok(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/notifications")
            .route("/send", web::post().to(send_notification))
            .route("/broadcast", web::post().to(broadcast_notification)),
    );
}
