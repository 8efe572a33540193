//! Request-level error type.
//!
//! Handlers return `Result<HttpResponse, ApiError>`. Client-facing variants
//! render as `{"message": ...}`; internal ones are logged in full and render
//! as a generic `{"error": ...}` body with status 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::chat_service::ChatError;
use crate::identity::IdentityError;
use crate::models::{ErrorResponse, MessageResponse};
use crate::services::SyncError;
use crate::store::StoreError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::StoreError(e) => ApiError::Store(e),
            SyncError::ProviderError(e) => ApiError::Identity(e),
            SyncError::MissingEmail => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::StoreError(e) => ApiError::Store(e),
            ChatError::ChatNotFound | ChatError::ParticipantNotFound => ApiError::NotFound(e.to_string()),
            ChatError::NotParticipant => ApiError::Forbidden(e.to_string()),
            ChatError::SelfChat | ChatError::EmptyMessage => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Identity(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            error!("{}", self);
            return HttpResponse::build(status).json(ErrorResponse {
                error: INTERNAL_ERROR_MESSAGE.to_string(),
            });
        }

        HttpResponse::build(status).json(MessageResponse {
            message: self.to_string(),
        })
    }
}
