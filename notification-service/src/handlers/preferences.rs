use super::ApiResponse;
use crate::error::AppError;
use crate::models::NotificationPreferences;
use crate::services::NotificationService;
/// Notification preferences handlers
use actix_web::{web, HttpResponse, ResponseError, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Update notification preferences request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdatePreferencesPayload {
    pub booking_updates: Option<bool>,
    pub payment_updates: Option<bool>,
    pub station_updates: Option<bool>,
    pub general_announcements: Option<bool>,
}

/// Get a recipient's notification preferences
///
/// GET /api/v1/preferences/{recipient_id}
pub async fn get_preferences(
    service: web::Data<Arc<NotificationService>>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let recipient_id = path.into_inner();

    match service.preferences(recipient_id).await {
        Ok(preferences) => Ok(HttpResponse::Ok().json(ApiResponse::ok(preferences))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Update notification preferences
///
/// PUT /api/v1/preferences/{recipient_id}
///
/// Only the fields present in the request are changed. An unset field keeps
/// its stored value; a stored `null` keeps meaning "no choice yet", which the
/// dispatch gate treats as enabled.
pub async fn update_preferences(
    service: web::Data<Arc<NotificationService>>,
    path: web::Path<Uuid>,
    req: web::Json<UpdatePreferencesPayload>,
) -> ActixResult<HttpResponse> {
    let recipient_id = path.into_inner();

    // First write for a recipient starts from the permissive default.
    let mut prefs = match service.preferences(recipient_id).await {
        Ok(prefs) => prefs,
        Err(AppError::RecipientNotFound(_)) => NotificationPreferences::default(),
        Err(e) => return Ok(e.error_response()),
    };

    if req.booking_updates.is_some() {
        prefs.booking_updates = req.booking_updates;
    }
    if req.payment_updates.is_some() {
        prefs.payment_updates = req.payment_updates;
    }
    if req.station_updates.is_some() {
        prefs.station_updates = req.station_updates;
    }
    if req.general_announcements.is_some() {
        prefs.general_announcements = req.general_announcements;
    }

    match service
        .update_preferences(recipient_id, prefs.clone())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::ok(prefs))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/preferences")
            .route("/{recipient_id}", web::get().to(get_preferences))
            .route("/{recipient_id}", web::put().to(update_preferences)),
    );
}
