use super::ApiResponse;
use crate::error::AppError;
use crate::models::{PushProviderKind, TokenRegistration};
use crate::services::NotificationService;
/// Device token registration handlers
use actix_web::{web, HttpResponse, ResponseError, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Register device token request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegisterDevicePayload {
    pub recipient_id: Uuid,
    pub token: String,
    /// Push provider: "fcm" or "expo"
    pub provider: String,
    /// Reported platform: "ios", "android", "web" or "unknown"
    pub platform: String,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub app_version: Option<String>,
    pub os_version: Option<String>,
}

/// Unregister device token request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UnregisterDevicePayload {
    pub recipient_id: Uuid,
    pub token: String,
}

/// Mark a token as used request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TouchDevicePayload {
    pub recipient_id: Uuid,
    pub token: String,
}

/// Register a device token for push notifications
///
/// POST /api/v1/devices/register
pub async fn register_device(
    service: web::Data<Arc<NotificationService>>,
    req: web::Json<RegisterDevicePayload>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();

    let provider = match PushProviderKind::parse(&req.provider) {
        Some(provider) => provider,
        None => {
            let e = AppError::Validation(format!("unknown provider: {}", req.provider));
            return Ok(e.error_response());
        }
    };

    let registration = TokenRegistration {
        token: req.token,
        provider,
        platform: req.platform,
        device_id: req.device_id,
        device_name: req.device_name,
        app_version: req.app_version,
        os_version: req.os_version,
    };

    match service.register_token(req.recipient_id, registration).await {
        Ok(token) => Ok(HttpResponse::Ok().json(ApiResponse::ok(token))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Remove a device token
///
/// POST /api/v1/devices/unregister
pub async fn unregister_device(
    service: web::Data<Arc<NotificationService>>,
    req: web::Json<UnregisterDevicePayload>,
) -> ActixResult<HttpResponse> {
    match service.unregister_token(req.recipient_id, &req.token).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::ok("unregistered".to_string()))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Refresh a token's last-used timestamp and reactivate it
///
/// POST /api/v1/devices/touch
pub async fn touch_device(
    service: web::Data<Arc<NotificationService>>,
    req: web::Json<TouchDevicePayload>,
) -> ActixResult<HttpResponse> {
    match service.touch_token(req.recipient_id, &req.token).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::ok("touched".to_string()))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Dispatch readiness for one recipient
///
/// GET /api/v1/devices/status/{recipient_id}
pub async fn device_status(
    service: web::Data<Arc<NotificationService>>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let recipient_id = path.into_inner();

    match service.status(recipient_id).await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::ok(status))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/devices")
            .route("/register", web::post().to(register_device))
            .route("/unregister", web::post().to(unregister_device))
            .route("/touch", web::post().to(touch_device))
            .route("/status/{recipient_id}", web::get().to(device_status)),
    );
}
