//! # Application Errors
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the HRMS                               │
//! │                                                                         │
//! │  Service call (LeaveService::approve)                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Access denied?   ─── AppError::Forbidden ───────────┐                 │
//! │         │                                            │                 │
//! │         ▼                                            │                 │
//! │  Rule violated?   ─── CoreError (hrms-core) ─────────┤                 │
//! │         │                                            │                 │
//! │         ▼                                            ▼                 │
//! │  Storage failed?  ─── StoreError ──────────────► AppError ──► ApiError │
//! │         │                                                 { code,      │
//! │         ▼                                                   message }  │
//! │  Success                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `ApiError` is what a presentation layer shows: a machine-readable
//! `code` and a human-readable `message`.

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::config::ConfigError;
use crate::identity::AuthError;
use crate::store::StoreError;
use hrms_core::{Capability, CoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The acting user's role does not grant the capability.
    #[error("You do not have permission to {capability}")]
    Forbidden { capability: Capability },
}

impl AppError {
    pub fn forbidden(capability: Capability) -> Self {
        AppError::Forbidden { capability }
    }

    /// Returns true for lifecycle violations, including ones detected by a
    /// conditional write.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, AppError::Core(e) if e.is_invalid_transition())
    }
}

impl From<hrms_core::ValidationError> for AppError {
    fn from(err: hrms_core::ValidationError) -> Self {
        AppError::Core(CoreError::Validation(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

// =============================================================================
// Presentation
// =============================================================================

/// Error returned across the application boundary.
///
/// ```json
/// { "code": "INVALID_STATE", "message": "Payroll p-1 is paid, cannot mark paid" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Lifecycle transition not allowed from the current state (409)
    InvalidState,

    /// Unique value already taken (409)
    Conflict,

    /// Signed in, but the role does not allow this (403)
    Forbidden,

    /// Authentication failed or no session (401)
    Unauthorized,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InvalidStateTransition { .. } => ErrorCode::InvalidState,
            CoreError::DuplicatePayroll { .. } => ErrorCode::Conflict,
            CoreError::DepartmentInUse { .. } => ErrorCode::Conflict,
            CoreError::Validation(e) => return ApiError::new(ErrorCode::ValidationError, e.to_string()),
            CoreError::RoleDepartmentMismatch { .. }
            | CoreError::InactiveManager(_)
            | CoreError::InactiveEmployee(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            StoreError::Duplicate(field) => {
                ApiError::new(ErrorCode::Conflict, format!("{} already exists", field))
            }
            StoreError::Conflict { .. } => ApiError::new(ErrorCode::InvalidState, err.to_string()),
            StoreError::InvalidReference(message) => {
                tracing::error!("Invalid reference: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            StoreError::Backend(message) => {
                // Log the actual error but return a generic message
                tracing::error!("Storage operation failed: {}", message);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Core(e) => e.into(),
            AppError::Store(e) => e.into(),
            AppError::Auth(e) => {
                let code = match &e {
                    AuthError::Validation(_) => ErrorCode::ValidationError,
                    AuthError::AlreadyRegistered => ErrorCode::Conflict,
                    _ => ErrorCode::Unauthorized,
                };
                ApiError::new(code, e.to_string())
            }
            AppError::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                ApiError::new(ErrorCode::Internal, "Service is misconfigured")
            }
            AppError::Forbidden { .. } => ApiError::new(ErrorCode::Forbidden, err.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use hrms_core::ValidationError;

    #[test]
    fn test_transition_maps_to_invalid_state() {
        let api: ApiError = AppError::from(CoreError::invalid_transition(
            "Payroll",
            "p-1",
            "paid",
            "mark paid",
        ))
        .into();
        assert_eq!(api.code, ErrorCode::InvalidState);
        assert_eq!(api.message, "Payroll p-1 is paid, cannot mark paid");
    }

    #[test]
    fn test_validation_message_is_user_visible() {
        let api: ApiError = AppError::from(ValidationError::PasswordTooShort { min: 6 }).into();
        assert_eq!(api.code, ErrorCode::ValidationError);
        assert_eq!(api.message, "Password must be at least 6 characters long");
    }

    #[test]
    fn test_backend_details_are_hidden() {
        let api: ApiError = StoreError::Backend("disk I/O error".into()).into();
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert_eq!(api.message, "Database operation failed");
    }

    #[test]
    fn test_forbidden() {
        let api: ApiError = AppError::forbidden(Capability::ManagePayroll).into();
        assert_eq!(api.code, ErrorCode::Forbidden);
        assert!(api.message.contains("manage payroll"));
    }

    #[test]
    fn test_auth_errors() {
        let api: ApiError = AppError::from(AuthError::InvalidCredentials).into();
        assert_eq!(api.code, ErrorCode::Unauthorized);
        assert_eq!(api.message, "Invalid email or password");

        let api: ApiError = AppError::from(AuthError::AlreadyRegistered).into();
        assert_eq!(api.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::NotFound, "Employee not found: e9"))
            .unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Employee not found: e9");
    }
}
