//! Error types for the Lost & Found server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::workflow::WorkflowError;

/// Stable numeric error codes returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 5,
    Duplicate = 6,
    BadValue = 7,
    InvalidTransition = 8,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::BusinessRule(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::InvalidTransition,
                msg.clone(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::RoleRequired(_)
            | WorkflowError::OwnDeclaration
            | WorkflowError::NotCreatingOfficer
            | WorkflowError::NotClaimant => AppError::Authorization(message),
            WorkflowError::AlreadyFinder | WorkflowError::AlreadyClaimant => {
                AppError::Conflict(message)
            }
            WorkflowError::ParticipantRequired(_)
            | WorkflowError::UnknownParticipant(_)
            | WorkflowError::DateInPast => AppError::Validation(message),
            WorkflowError::NoSuchRestitution(_) => AppError::NotFound(message),
            WorkflowError::WrongKind { .. }
            | WorkflowError::InvalidTransition { .. }
            | WorkflowError::RestitutionStatus { .. } => AppError::BusinessRule(message),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Map a unique-constraint violation to a conflict with a readable message
pub(crate) fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{ItemState, Role};

    #[test]
    fn test_workflow_errors_map_to_status() {
        let err: AppError = WorkflowError::AlreadyFinder.into();
        assert_eq!(err.parts().0, StatusCode::CONFLICT);

        let err: AppError = WorkflowError::RoleRequired(Role::Officer).into();
        assert_eq!(err.parts().0, StatusCode::FORBIDDEN);

        let err: AppError = WorkflowError::InvalidTransition {
            from: ItemState::Returned,
            action: "schedule a restitution",
        }
        .into();
        assert_eq!(err.parts().0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.parts().1, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let (status, _, message) = AppError::Internal("smtp exploded".to_string()).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }
}
