//! # Store Interfaces
//!
//! One async trait per entity. Services depend on `Arc<dyn Store>`, so the
//! same service code runs against SQLite in production and against the
//! in-memory store in tests.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PayrollService ── Arc<dyn Store> ──┬── SqliteStore  (hrms-db)         │
//! │  LeaveService   ──┘                 └── MemoryStore  (tokio Mutex)     │
//! │                                                                         │
//! │  Store = EmployeeStore + DepartmentStore + RoleStore + AttendanceStore │
//! │        + LeaveStore + PayrollStore + UserRoleStore + ActivityStore     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lifecycle writes (`record_leave_decision`, `record_payment`,
//! `update_payroll_components`) are conditional on the stored status and
//! report [`StoreError::Conflict`] when another writer got there first.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use hrms_core::filters::{AttendanceFilter, EmployeeFilter, LeaveFilter, PayrollFilter};
use hrms_core::payroll::PayrollKey;
use hrms_core::{
    Attendance, AuditLog, Department, Employee, LeaveRequest, Notification, Payroll,
    PayrollPeriod, Role, UserRole, UserRoleAssignment,
};
use hrms_db::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate value for {0}")]
    Duplicate(String),

    /// The stored record left the expected state before this write landed.
    #[error("{entity} {id} is no longer {expected}")]
    Conflict {
        entity: String,
        id: String,
        expected: String,
    },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(
        entity: impl Into<String>,
        id: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        StoreError::Conflict {
            entity: entity.into(),
            id: id.into(),
            expected: expected.into(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::UniqueViolation { field, .. } => StoreError::Duplicate(field),
            DbError::StateConflict {
                entity,
                id,
                expected,
            } => StoreError::Conflict {
                entity,
                id,
                expected,
            },
            DbError::ForeignKeyViolation { message } => StoreError::InvalidReference(message),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Entity Stores
// =============================================================================

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>>;
    async fn employee_for_user(&self, user_id: &str) -> StoreResult<Option<Employee>>;
    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>>;
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()>;
    async fn update_employee(&self, employee: &Employee) -> StoreResult<()>;
    async fn count_employees_in_department(&self, department_id: &str) -> StoreResult<usize>;
}

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn get_department(&self, id: &str) -> StoreResult<Option<Department>>;
    async fn list_departments(&self) -> StoreResult<Vec<Department>>;
    async fn insert_department(&self, department: &Department) -> StoreResult<()>;
    async fn update_department(&self, department: &Department) -> StoreResult<()>;
    async fn delete_department(&self, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn get_role(&self, id: &str) -> StoreResult<Option<Role>>;
    async fn list_roles(&self, department_id: Option<&str>) -> StoreResult<Vec<Role>>;
    async fn insert_role(&self, role: &Role) -> StoreResult<()>;
    async fn delete_role(&self, id: &str) -> StoreResult<()>;
    async fn count_roles_in_department(&self, department_id: &str) -> StoreResult<usize>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Inserts or overwrites the record for `(employee_id, date)`. The
    /// stored record keeps its original id and `created_at`; notes are kept
    /// when the new record has none.
    async fn upsert_attendance(&self, record: &Attendance) -> StoreResult<Attendance>;
    async fn get_attendance(&self, employee_id: &str, date: NaiveDate)
        -> StoreResult<Option<Attendance>>;
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn get_leave(&self, id: &str) -> StoreResult<Option<LeaveRequest>>;
    async fn list_leaves(&self, filter: &LeaveFilter) -> StoreResult<Vec<LeaveRequest>>;
    async fn insert_leave(&self, request: &LeaveRequest) -> StoreResult<()>;
    /// Writes a decision only if the stored request is still pending.
    async fn record_leave_decision(&self, decided: &LeaveRequest) -> StoreResult<()>;
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    async fn get_payroll(&self, id: &str) -> StoreResult<Option<Payroll>>;
    async fn list_payroll(&self, filter: &PayrollFilter) -> StoreResult<Vec<Payroll>>;
    async fn existing_payroll_keys(&self, period: PayrollPeriod) -> StoreResult<HashSet<PayrollKey>>;
    /// Stores generated records, skipping natural keys that already exist.
    /// Returns what was stored.
    async fn insert_generated_payroll(&self, records: Vec<Payroll>) -> StoreResult<Vec<Payroll>>;
    /// Writes a payment only if the stored record is still `generated`.
    async fn record_payment(&self, paid: &Payroll) -> StoreResult<()>;
    /// Writes revised components only if the stored record is still `generated`.
    async fn update_payroll_components(&self, revised: &Payroll) -> StoreResult<()>;
}

#[async_trait]
pub trait UserRoleStore: Send + Sync {
    /// Earliest assignment for the user.
    async fn role_for_user(&self, user_id: &str) -> StoreResult<Option<UserRole>>;
    async fn assign_role(&self, assignment: &UserRoleAssignment) -> StoreResult<()>;
}

/// Audit trail and in-app notifications.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn append_audit(&self, entry: &AuditLog) -> StoreResult<()>;
    async fn list_audit(
        &self,
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<AuditLog>>;
    async fn push_notification(&self, notification: &Notification) -> StoreResult<()>;
    async fn notifications_for(&self, user_id: &str, unread_only: bool)
        -> StoreResult<Vec<Notification>>;
    async fn mark_notification_read(&self, id: &str) -> StoreResult<()>;
}

/// Everything a service may need.
pub trait Store:
    EmployeeStore
    + DepartmentStore
    + RoleStore
    + AttendanceStore
    + LeaveStore
    + PayrollStore
    + UserRoleStore
    + ActivityStore
{
}

impl<T> Store for T where
    T: EmployeeStore
        + DepartmentStore
        + RoleStore
        + AttendanceStore
        + LeaveStore
        + PayrollStore
        + UserRoleStore
        + ActivityStore
{
}
