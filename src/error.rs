//! Error type shared by the leave engine and the HTTP layer.
//!
//! Every variant carries a stable machine-readable code and maps onto an HTTP
//! status through actix-web's `ResponseError`.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::leave::validator::Violation;
use crate::model::leave_request::LeaveStatus;

#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("Leave request failed validation ({} violation(s))", .0.len())]
    ValidationFailed(Vec<Violation>),

    #[error("Insufficient balance: requested {requested} day(s), remaining {remaining}")]
    InsufficientBalance { requested: u32, remaining: u32 },

    #[error("No approver can be resolved for employee {employee_id}")]
    NoApprover { employee_id: u64 },

    #[error("Cannot move a leave request from {from} to {to}")]
    InvalidTransition { from: LeaveStatus, to: LeaveStatus },

    #[error("Employee {actor_id} is not the approver of leave request {request_id}")]
    NotApprover { request_id: u64, actor_id: u64 },

    #[error("Employee {actor_id} does not own leave request {request_id}")]
    NotRequestOwner { request_id: u64, actor_id: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetails {
    #[schema(value_type = String, example = "INSUFFICIENT_BALANCE")]
    pub code: &'static str,
    pub message: String,
    /// Violation list or balance figures, depending on `code`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl LeaveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::NoApprover { .. } => "NO_APPROVER",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotApprover { .. } => "NOT_APPROVER",
            Self::NotRequestOwner { .. } => "NOT_REQUEST_OWNER",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn not_found(what: &str, id: u64) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::ValidationFailed(violations) => serde_json::to_value(violations).ok(),
            Self::InsufficientBalance {
                requested,
                remaining,
            } => Some(serde_json::json!({ "requested": requested, "remaining": remaining })),
            _ => None,
        }
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InsufficientBalance { .. }
            | Self::NoApprover { .. }
            | Self::InvalidTransition { .. }
            | Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::NotApprover { .. } | Self::NotRequestOwner { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Database failures are logged, never echoed to the client.
        let message = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "A database error occurred".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: ErrorDetails {
                code: self.code(),
                message,
                details: self.details(),
            },
        })
    }
}

pub type LeaveResult<T> = Result<T, LeaveError>;
