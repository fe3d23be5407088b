//! # Validation Module
//!
//! Form and referential validation for HR records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form checks (THIS MODULE)                                    │
//! │  ├── Sign-up: names, password match, password length                   │
//! │  └── Employee / leave fields                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Referential checks (THIS MODULE, fed by services)            │
//! │  ├── Role belongs to the employee's department                         │
//! │  └── Department manager is an active employee                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (employee_id, date) / (employee_id, year, month)           │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Department, Employee, Role};
use crate::MIN_PASSWORD_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;

// =============================================================================
// Field Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a person or department name.
///
/// ```rust
/// use hrms_core::validation::validate_name;
///
/// assert!(validate_name("first_name", "Asha").is_ok());
/// assert!(validate_name("first_name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;
    if value.trim().chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

/// Validates an email address: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    validate_required("email", email)?;

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing @"))?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid("malformed address"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }
    Ok(())
}

/// Validates password length against [`MIN_PASSWORD_LENGTH`].
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Rejects negative salary or payroll components.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an inclusive date range and returns its length in days.
///
/// ```rust
/// use chrono::NaiveDate;
/// use hrms_core::validation::validate_date_range;
///
/// let from = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let to = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
/// assert_eq!(validate_date_range(from, to).unwrap(), 5);
/// assert!(validate_date_range(to, from).is_err());
/// ```
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<i64> {
    if to < from {
        return Err(ValidationError::InvalidDateRange {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok((to - from).num_days() + 1)
}

// =============================================================================
// Sign-up Form
// =============================================================================

/// Sign-up form as submitted by the user.
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

impl SignUpForm {
    /// Runs the client-side checks in display order: names, match, length.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(ValidationError::NamesRequired);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        validate_password(&self.password)?;
        validate_email(&self.email)
    }
}

// =============================================================================
// Referential Checks
// =============================================================================

/// Checks an employee's department/role pair.
///
/// Callers pass what their lookups returned; `None` means the id did not
/// resolve.
pub fn check_assignment(
    department_id: &str,
    department: Option<&Department>,
    role_id: &str,
    role: Option<&Role>,
) -> CoreResult<()> {
    if department.is_none() {
        return Err(CoreError::not_found("Department", department_id));
    }
    let role = role.ok_or_else(|| CoreError::not_found("Role", role_id))?;
    if role.department_id != department_id {
        return Err(CoreError::RoleDepartmentMismatch {
            role_id: role_id.to_string(),
            department_id: department_id.to_string(),
        });
    }
    Ok(())
}

/// Checks that a prospective department manager exists and is active.
pub fn check_manager(manager_id: &str, manager: Option<&Employee>) -> CoreResult<()> {
    let manager = manager.ok_or_else(|| CoreError::not_found("Employee", manager_id))?;
    if !manager.is_active() {
        return Err(CoreError::InactiveManager(manager_id.to_string()));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
