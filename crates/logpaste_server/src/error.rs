//! HTTP mapping for core errors.

use crate::AppError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Handler error carrying an [`AppError`] to the response boundary.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl HttpError {
    /// Status code the wrapped error is reported with.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::IdSpaceExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::StorageMessage(_) | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AppError::BadRequest(msg) | AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::NotFound => "Paste not found".to_string(),
            AppError::RateLimited { .. } => self.0.to_string(),
            AppError::IdSpaceExhausted { attempts } => {
                tracing::error!("Paste id allocation failed after {} attempts", attempts);
                "Could not allocate a paste id. Try again.".to_string()
            }
            err => {
                tracing::error!("Storage error: {}", err);
                "Storage error".to_string()
            }
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if let AppError::RateLimited { retry_after_secs } = self.0 {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_secs),
            );
        }
        response
    }
}
