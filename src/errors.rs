use std::fmt;

use actix_web::{
    HttpResponse,
    error::ResponseError,
    http::{StatusCode, header::ContentType},
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    RateLimited(String),
    DuplicateLead(String),
    NotFound(String),
    UnauthorizedAccess,
    DeliveryError(String),
    PersistenceError(String),
    UpstreamError(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors
                    .iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            AppError::DuplicateLead(msg) => write!(f, "Duplicate lead: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::UnauthorizedAccess => write!(f, "Unauthorized access"),
            AppError::DeliveryError(msg) => write!(f, "Email delivery failed: {}", msg),
            AppError::PersistenceError(msg) => write!(f, "Lead store failure: {}", msg),
            AppError::UpstreamError(msg) => write!(f, "Upstream request failed: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl AppError {
    /// Stable classification string clients can branch on.
    pub fn classification(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::RateLimited(_) => "rate_limit_error",
            AppError::DuplicateLead(_) => "duplicate_lead_error",
            AppError::NotFound(_) => "not_found",
            AppError::UnauthorizedAccess => "authorization_error",
            AppError::DeliveryError(_)
            | AppError::PersistenceError(_)
            | AppError::UpstreamError(_)
            | AppError::InternalError(_) => "server_error",
        }
    }

    /// Message safe to show to the person on the other end. Internal detail
    /// stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => {
                "Please correct the highlighted fields and try again.".to_string()
            }
            AppError::RateLimited(msg) | AppError::DuplicateLead(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::UnauthorizedAccess => "Missing or invalid authorization token.".to_string(),
            AppError::DeliveryError(_)
            | AppError::PersistenceError(_)
            | AppError::UpstreamError(_)
            | AppError::InternalError(_) => {
                "Something went wrong on our end. Please try again later.".to_string()
            }
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        self.error_response()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = match self {
            AppError::ValidationError(errors) => serde_json::json!({
                "success": false,
                "error": self.classification(),
                "message": self.public_message(),
                "details": errors,
            }),
            _ => serde_json::json!({
                "success": false,
                "error": self.classification(),
                "message": self.public_message(),
            }),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::DuplicateLead(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::DeliveryError(_) | AppError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            AppError::PersistenceError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

/// Failures while reading or writing the lead store file.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display("I/O error: {_0}")]
    Io(String),

    #[display("malformed store file: {_0}")]
    Malformed(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
