use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("recipient not found: {0}")]
    RecipientNotFound(Uuid),

    #[error("push provider error: {0}")]
    Provider(String),

    #[error("push provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("token store error: {0}")]
    Store(String),
}

impl AppError {
    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::RecipientNotFound(_) => 404,
            AppError::Provider(_) => 502,
            AppError::ProviderNotConfigured(_) => 503,
            AppError::Config(_) | AppError::StartServer(_) | AppError::Store(_) => 500,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "data": null,
            "error": self.to_string(),
        }))
    }
}

impl From<chargease_fcm_shared::FcmError> for AppError {
    fn from(e: chargease_fcm_shared::FcmError) -> Self {
        AppError::Provider(e.to_string())
    }
}

impl From<chargease_expo_shared::ExpoError> for AppError {
    fn from(e: chargease_expo_shared::ExpoError) -> Self {
        AppError::Provider(e.to_string())
    }
}
