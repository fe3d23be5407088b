//! # Application Services
//!
//! Each service takes the acting user, checks one capability through the
//! access guard, applies the `hrms-core` rules and persists through the
//! store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PayrollService::mark_paid(&actor, id, ..)                             │
//! │       │                                                                 │
//! │       ├── actor.require(Capability::ManagePayroll)   ← access guard    │
//! │       ├── store.get_payroll(id)                                        │
//! │       ├── payroll.mark_paid(..)                      ← hrms-core rule  │
//! │       ├── store.record_payment(&payroll)             ← conditional     │
//! │       └── activity: audit entry + notification                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod activity;
pub mod attendance;
pub mod dashboard;
pub mod department;
pub mod employee;
pub mod leave;
pub mod payroll;

pub use activity::{ActivityLog, ActivityService};
pub use attendance::AttendanceService;
pub use dashboard::DashboardService;
pub use department::DepartmentService;
pub use employee::{EmployeeService, NewEmployee};
pub use leave::LeaveService;
pub use payroll::PayrollService;

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::store::{Store, StoreError};
use hrms_core::{resolve_permissions, Capability, CoreError, Permissions, UserRole};

// =============================================================================
// Actor and Access Guard
// =============================================================================

/// The user on whose behalf a service call runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Option<UserRole>,
    /// Employee record linked to the user, if any.
    pub employee_id: Option<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Option<UserRole>) -> Self {
        Actor {
            user_id: user_id.into(),
            role,
            employee_id: None,
        }
    }

    pub fn with_employee(mut self, employee_id: impl Into<String>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }

    pub fn permissions(&self) -> Permissions {
        resolve_permissions(self.role)
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.permissions().allows(capability)
    }

    /// Access guard: fails with `Forbidden` unless the role grants
    /// `capability`.
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.can(capability) {
            return Ok(());
        }
        warn!(
            user_id = %self.user_id,
            role = ?self.role,
            capability = capability.as_str(),
            "Access denied"
        );
        Err(AppError::forbidden(capability))
    }

    /// True when `employee_id` is the actor's own record.
    pub fn is_self(&self, employee_id: &str) -> bool {
        self.employee_id.as_deref() == Some(employee_id)
    }
}

/// Turns a lost conditional write into the same error the in-memory rule
/// check would have produced, using the state the record is now in.
pub(crate) fn lost_race(
    err: StoreError,
    entity: &str,
    id: &str,
    current_status: Option<&str>,
    action: &str,
) -> AppError {
    match (err, current_status) {
        (StoreError::Conflict { .. }, Some(status)) => {
            CoreError::invalid_transition(entity, id, status, action).into()
        }
        (err, _) => err.into(),
    }
}

// =============================================================================
// Service Bundle
// =============================================================================

/// All services over one store.
#[derive(Clone)]
pub struct Services {
    pub employees: EmployeeService,
    pub departments: DepartmentService,
    pub attendance: AttendanceService,
    pub leave: LeaveService,
    pub payroll: PayrollService,
    pub activity: ActivityService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let log = ActivityLog::new(store.clone());
        Services {
            employees: EmployeeService::new(store.clone(), log.clone()),
            departments: DepartmentService::new(store.clone(), log.clone()),
            attendance: AttendanceService::new(store.clone(), log.clone()),
            leave: LeaveService::new(store.clone(), log.clone()),
            payroll: PayrollService::new(
                store.clone(),
                log,
                Arc::new(config.payroll.compensation.clone()),
                config.payroll.payment_method.clone(),
            ),
            activity: ActivityService::new(store.clone()),
            dashboard: DashboardService::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard() {
        let hr = Actor::new("u-hr", Some(UserRole::Hr));
        assert!(hr.require(Capability::ManagePayroll).is_ok());

        let manager = Actor::new("u-mgr", Some(UserRole::Manager));
        assert!(manager.require(Capability::ViewPayroll).is_ok());
        assert!(matches!(
            manager.require(Capability::ManagePayroll),
            Err(AppError::Forbidden {
                capability: Capability::ManagePayroll
            })
        ));

        let nobody = Actor::new("u-0", None);
        assert!(nobody.require(Capability::ViewDashboard).is_err());
    }

    #[test]
    fn test_lost_race_maps_conflict() {
        let err = lost_race(
            StoreError::conflict("Leave request", "lr-1", "pending"),
            "Leave request",
            "lr-1",
            Some("approved"),
            "reject",
        );
        assert!(err.is_invalid_transition());
        assert_eq!(err.to_string(), "Leave request lr-1 is approved, cannot reject");

        let other = lost_race(StoreError::Backend("x".into()), "Payroll", "p", None, "mark paid");
        assert!(matches!(other, AppError::Store(StoreError::Backend(_))));
    }
}
