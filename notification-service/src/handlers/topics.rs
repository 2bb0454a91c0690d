use super::{build_payload, ApiResponse};
use crate::services::NotificationService;
/// FCM topic subscription and fan-out handlers
use actix_web::{web, HttpResponse, ResponseError, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Topic membership change request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TopicMembershipPayload {
    pub tokens: Vec<String>,
    pub topic: String,
}

/// Request to send a notification to a topic
///
/// Topic sends skip per-recipient preferences; membership is the opt-in.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TopicSendPayload {
    pub topic: String,
    pub title: String,
    pub body: String,
    pub category: String,
    pub icon: Option<String>,
    pub click_action: Option<String>,
    #[serde(default)]
    pub extra_data: HashMap<String, String>,
}

/// Response for a topic send
#[derive(Debug, Serialize)]
pub struct TopicSendResult {
    pub topic: String,
    pub message_id: String,
}

/// Subscribe tokens to an FCM topic
///
/// POST /api/v1/topics/subscribe
pub async fn subscribe_topic(
    service: web::Data<Arc<NotificationService>>,
    req: web::Json<TopicMembershipPayload>,
) -> ActixResult<HttpResponse> {
    match service.subscribe_to_topic(&req.tokens, &req.topic).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::ok(result))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Unsubscribe tokens from an FCM topic
///
/// POST /api/v1/topics/unsubscribe
pub async fn unsubscribe_topic(
    service: web::Data<Arc<NotificationService>>,
    req: web::Json<TopicMembershipPayload>,
) -> ActixResult<HttpResponse> {
    match service.unsubscribe_from_topic(&req.tokens, &req.topic).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::ok(result))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Send a notification to every subscriber of a topic
///
/// POST /api/v1/topics/send
pub async fn send_to_topic(
    service: web::Data<Arc<NotificationService>>,
    req: web::Json<TopicSendPayload>,
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

    match service.send_to_topic(&req.topic, &payload).await {
        Ok(message_id) => Ok(HttpResponse::Ok().json(ApiResponse::ok(TopicSendResult {
            topic: req.topic,
            message_id,
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/topics")
            .route("/subscribe", web::post().to(subscribe_topic))
            .route("/unsubscribe", web::post().to(unsubscribe_topic))
            .route("/send", web::post().to(send_to_topic)),
    );
}
