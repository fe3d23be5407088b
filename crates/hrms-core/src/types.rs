//! # Domain Types
//!
//! Core HR records used throughout the HRMS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Department    │◄──│      Role       │   │    Employee     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  department_id  │   │  employee_code  │       │
//! │  │  manager_id ────┼──►│  name           │   │  department_id  │       │
//! │  └─────────────────┘   └─────────────────┘   │  role_id        │       │
//! │                                              │  salary_monthly │       │
//! │                                              └────────┬────────┘       │
//! │                                                       │                │
//! │       ┌───────────────────────┬───────────────────────┤                │
//! │       ▼                       ▼                       ▼                │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Attendance    │   │  LeaveRequest   │   │     Payroll     │       │
//! │  │ (employee,date) │   │ pending→decided │   │ (emp,year,month)│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                (see payroll.rs)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for relations
//! - Business key where one exists: `employee_code`, (employee, date) for
//!   attendance, (employee, year, month) for payroll

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// User Role
// =============================================================================

/// Application role assigned to an authenticated user.
///
/// Stored in `user_roles`; the earliest row for a user wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Hr,
    Manager,
    Employee,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::Hr,
        UserRole::Manager,
        UserRole::Employee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Hr => "hr",
            UserRole::Manager => "manager",
            UserRole::Employee => "employee",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Employee
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: UserRole::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Employee
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
        }
    }
}

impl Default for EmployeeStatus {
    fn default() -> Self {
        EmployeeStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeType {
    Permanent,
    Contract,
}

impl Default for EmployeeType {
    fn default() -> Self {
        EmployeeType::Permanent
    }
}

/// A person on the payroll.
///
/// `department_id` and `role_id` must reference existing records, and the
/// role must belong to that department. The employee service checks this
/// on every create and update (see `validation::check_assignment`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable business key, e.g. `EMP-0042`.
    pub employee_code: String,

    /// Linked identity-provider user, when the employee can sign in.
    pub user_id: Option<String>,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub photo_url: Option<String>,

    pub department_id: String,
    pub role_id: String,

    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,

    #[ts(as = "String")]
    pub join_date: NaiveDate,

    pub status: EmployeeStatus,

    /// Monthly base salary; becomes `basic` on generated payroll.
    pub salary_monthly: Money,

    pub bank_account: Option<String>,
    pub ifsc_code: Option<String>,
    pub employee_type: EmployeeType,
    pub emergency_contact: Option<String>,

    /// User that created the record.
    pub created_by: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Department & Role
// =============================================================================

/// An organisational unit. The optional manager must be an active employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub manager_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A job title scoped to one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Role {
    pub id: String,
    pub department_id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Attendance
// =============================================================================

/// Daily attendance status.
///
/// `HalfDay` and `Late` exist in stored data but cannot be marked through
/// the attendance service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    HalfDay,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Leave => "leave",
            AttendanceStatus::HalfDay => "half_day",
            AttendanceStatus::Late => "late",
        }
    }

    /// Whether the status can be set by marking.
    pub fn is_markable(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::Present | AttendanceStatus::Absent | AttendanceStatus::Leave
        )
    }
}

/// One attendance record per (employee, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Attendance {
    pub id: String,
    pub employee_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: String,
    #[ts(as = "String")]
    pub marked_at: DateTime<Utc>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Leave
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Paid,
    Unpaid,
    Medical,
    Casual,
    Annual,
}

/// Leave request lifecycle.
///
/// ```text
/// pending ──approve──► approved (terminal)
///    │
///    └─────reject───► rejected (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

impl Default for LeaveStatus {
    fn default() -> Self {
        LeaveStatus::Pending
    }
}

/// A request for time off. Decisions go through `leave::approve` / `leave::reject`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LeaveRequest {
    pub id: String,
    pub employee_id: String,
    pub leave_type: LeaveType,
    #[ts(as = "String")]
    pub from_date: NaiveDate,
    #[ts(as = "String")]
    pub to_date: NaiveDate,
    /// Inclusive day count of `from_date..=to_date`.
    pub total_days: i64,
    pub reason: String,
    pub attachment_url: Option<String>,
    pub status: LeaveStatus,
    pub approver_id: Option<String>,
    pub approver_comment: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payroll Status
// =============================================================================

/// Payroll lifecycle: `generated → paid`. `Rejected` is reserved and has no
/// transition into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PayrollStatus {
    Generated,
    Paid,
    Rejected,
}

impl PayrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Generated => "generated",
            PayrollStatus::Paid => "paid",
            PayrollStatus::Rejected => "rejected",
        }
    }
}

impl Default for PayrollStatus {
    fn default() -> Self {
        PayrollStatus::Generated
    }
}

// =============================================================================
// User Role Assignment
// =============================================================================

/// A row of `user_roles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserRoleAssignment {
    pub id: String,
    pub user_id: String,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notifications & Audit
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

/// In-app message for a user, e.g. "Leave request approved".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    /// Entity the notification is about, e.g. `leave_request`.
    pub related_type: Option<String>,
    pub related_id: Option<String>,
    pub is_read: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a state-changing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuditLog {
    pub id: String,
    pub user_id: Option<String>,
    /// Verb such as `payroll.mark_paid`.
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    pub details: serde_json::Value,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(" HR ".parse::<UserRole>().unwrap(), UserRole::Hr);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_user_role_serde_names() {
        let json = serde_json::to_string(&UserRole::Hr).unwrap();
        assert_eq!(json, "\"hr\"");
        assert_eq!(UserRole::default(), UserRole::Employee);
    }

    #[test]
    fn test_attendance_markable_statuses() {
        assert!(AttendanceStatus::Present.is_markable());
        assert!(AttendanceStatus::Absent.is_markable());
        assert!(AttendanceStatus::Leave.is_markable());
        assert!(!AttendanceStatus::HalfDay.is_markable());
        assert!(!AttendanceStatus::Late.is_markable());
    }

    #[test]
    fn test_reserved_attendance_status_decodes() {
        let status: AttendanceStatus = serde_json::from_str("\"half_day\"").unwrap();
        assert_eq!(status, AttendanceStatus::HalfDay);
        assert_eq!(status.as_str(), "half_day");
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(LeaveStatus::default(), LeaveStatus::Pending);
        assert_eq!(PayrollStatus::default(), PayrollStatus::Generated);
        assert_eq!(EmployeeStatus::default(), EmployeeStatus::Active);
        assert_eq!(EmployeeType::default(), EmployeeType::Permanent);
    }
}
