use std::collections::BTreeMap;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A submitted form failed validation; the text fields are echoed back
    /// so the client can re-render the form.
    #[error("Invalid form: {message}")]
    InvalidForm {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Media upload failed: {0}")]
    MediaUpload(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::InvalidForm { .. }
            | AppError::MediaUpload(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to show to a client. Internal details are logged, not returned.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::MediaUpload(msg) => {
                tracing::error!("Media upload error: {}", msg);
                "Houve um erro ao fazer o upload do arquivo. Tente novamente.".to_string()
            }
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                msg.clone()
            }
            AppError::InvalidForm { message, .. } => message.clone(),
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimitExceeded(msg)
            | AppError::ServiceUnavailable(msg) => msg.clone(),
        }
    }
}

impl AppError {
    /// Turn this error into a form rejection carrying `fields`, keeping the
    /// client-facing message
    pub fn with_form_fields(self, fields: BTreeMap<String, String>) -> AppError {
        AppError::InvalidForm {
            message: self.public_message(),
            fields,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.public_message();

        match self {
            AppError::InvalidForm { fields, .. } => {
                let body = ApiResponse {
                    success: false,
                    data: Some(fields),
                    message: Some(message.clone()),
                    meta: None,
                    errors: Some(vec![message]),
                };
                (status, Json(body)).into_response()
            }
            AppError::Validation(_) => {
                let body = ApiResponse::<()>::error(Some(message.clone()), Some(vec![message]));
                (status, Json(body)).into_response()
            }
            AppError::Unauthorized(_) => {
                let body = ApiResponse::<()>::error(Some(message), None);
                (
                    status,
                    [(header::WWW_AUTHENTICATE, "Basic realm=\"Login Required\"")],
                    Json(body),
                )
                    .into_response()
            }
            _ => {
                let body = ApiResponse::<()>::error(Some(message), None);
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Flat `{success: false, message}` body used by the interaction endpoints
#[derive(Debug, Serialize)]
pub struct FlatError {
    pub success: bool,
    pub message: String,
}

/// Wraps an `AppError` so it renders as a [`FlatError`] with the same status
#[derive(Debug)]
pub struct FlatAppError(pub AppError);

impl From<AppError> for FlatAppError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<sqlx::Error> for FlatAppError {
    fn from(error: sqlx::Error) -> Self {
        Self(AppError::Database(error))
    }
}

impl IntoResponse for FlatAppError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let message = match &self.0 {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!("Interaction request failed: {}", self.0);
                "Ocorreu um erro ao processar sua solicitação.".to_string()
            }
            other => other.public_message(),
        };

        (
            status,
            Json(FlatError {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_becomes_form_rejection() {
        let fields = BTreeMap::from([("titulo".to_string(), "Luz no corredor".to_string())]);
        let err = AppError::MediaUpload("bucket offline".into()).with_form_fields(fields);

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        match err {
            AppError::InvalidForm { message, fields } => {
                assert_eq!(message, "Houve um erro ao fazer o upload do arquivo. Tente novamente.");
                assert_eq!(fields["titulo"], "Luz no corredor");
            }
            other => panic!("expected InvalidForm, got {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::MediaUpload("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidForm {
                message: "x".into(),
                fields: BTreeMap::new()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RateLimitExceeded("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::ServiceUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let error = AppError::Internal("connection string leaked".into());
        assert_eq!(error.public_message(), "Internal server error");
    }

    #[test]
    fn test_unauthorized_sets_www_authenticate() {
        let response = AppError::Unauthorized("no".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn test_flat_error_keeps_status() {
        let response =
            FlatAppError(AppError::Forbidden("Você já votou neste relato.".into())).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
