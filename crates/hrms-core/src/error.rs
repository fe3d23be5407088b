//! # Error Types
//!
//! Domain-specific error types for hrms-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  hrms-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  hrms-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  hrms-app errors                                                       │
//! │  ├── StoreError / AuthError / AppError                                 │
//! │  └── ApiError         - What the frontend sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → AppError → ApiError → Frontend    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are caught by the
/// service layer and translated to user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A lifecycle operation was attempted from a state that does not allow it.
    ///
    /// ## When This Occurs
    /// - Approving or rejecting a leave request that is no longer pending
    /// - Marking a payroll record paid a second time
    ///
    /// ```text
    /// Payroll { status: paid }
    ///      │
    ///      ▼
    /// mark_paid(...)
    ///      │
    ///      ▼
    /// InvalidStateTransition { entity: "Payroll", from: "paid", action: "mark paid" }
    /// ```
    #[error("{entity} {id} is {from}, cannot {action}")]
    InvalidStateTransition {
        entity: String,
        id: String,
        from: String,
        action: String,
    },

    /// The chosen role belongs to a different department.
    #[error("Role {role_id} does not belong to department {department_id}")]
    RoleDepartmentMismatch {
        role_id: String,
        department_id: String,
    },

    /// Department managers must be active employees.
    #[error("Employee {0} is not active and cannot manage a department")]
    InactiveManager(String),

    /// Operation requires an active employee.
    #[error("Employee {0} is not active")]
    InactiveEmployee(String),

    /// Department still has employees or roles pointing at it.
    #[error("Department {department_id} is still referenced by {employees} employee(s) and {roles} role(s)")]
    DepartmentInUse {
        department_id: String,
        employees: usize,
        roles: usize,
    },

    /// A payroll record already exists for the employee and period.
    #[error("Payroll for employee {employee_id} already exists for {year}-{month:02}")]
    DuplicatePayroll {
        employee_id: String,
        year: i32,
        month: u32,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidStateTransition error.
    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl Into<String>,
        from: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        CoreError::InvalidStateTransition {
            entity: entity.into(),
            id: id.into(),
            from: from.into(),
            action: action.into(),
        }
    }

    /// Returns true for lifecycle violations.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, CoreError::InvalidStateTransition { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These block submission of a form or command before any business logic
/// runs. Messages are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Both name fields are needed at sign-up.
    #[error("First name and last name are required")]
    NamesRequired,

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Password below the minimum length.
    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Monetary or count value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// End date before start date.
    #[error("{to} is before {from}")]
    InvalidDateRange { from: String, to: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
