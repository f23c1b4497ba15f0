//! Error types for carbonweb-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use carbonweb_core::{CoreError, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error.code() {
            ErrorCode::UserNotFound
            | ErrorCode::TemplateNotFound
            | ErrorCode::SurveyNotFound => ApiError::NotFound {
                resource: error.to_string(),
            },
            ErrorCode::ValidationError => ApiError::BadRequest {
                message: error.to_string(),
            },
            ErrorCode::DuplicateEntry => ApiError::Conflict {
                message: error.to_string(),
            },
            ErrorCode::CodeExhausted => ApiError::Unavailable {
                message: error.to_string(),
            },
            ErrorCode::StoreError | ErrorCode::InternalError => {
                log::error!(target: "carbonweb::api", "{}", error.to_details());
                ApiError::InternalError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "message": self.to_string() }).to_string();
        (self.status(), body).into_response()
    }
}

// ==================== Tests ====================
