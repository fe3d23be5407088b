//! # Role/Permission Resolver
//!
//! Maps a user's role to the fixed set of view/manage flags. Every page and
//! service action asks this module; nothing else decides access.
//!
//! ```text
//! ┌──────────────────────┬───────┬─────┬─────────┬──────────┐
//! │ Permission           │ admin │ hr  │ manager │ employee │
//! ├──────────────────────┼───────┼─────┼─────────┼──────────┤
//! │ dashboard / profile  │   ✓   │  ✓  │    ✓    │    ✓     │
//! │ view employees       │   ✓   │  ✓  │    ✓    │    ✗     │
//! │ manage employees     │   ✓   │  ✓  │    ✗    │    ✗     │
//! │ view departments     │   ✓   │  ✓  │    ✓    │    ✗     │
//! │ manage departments   │   ✓   │  ✓  │    ✗    │    ✗     │
//! │ attendance           │   ✓   │  ✓  │    ✓    │   view   │
//! │ leave requests       │   ✓   │  ✓  │    ✓    │   view   │
//! │ payroll              │   ✓   │  ✓  │   view  │    ✗     │
//! │ view reports         │   ✓   │  ✓  │    ✓    │    ✗     │
//! └──────────────────────┴───────┴─────┴─────────┴──────────┘
//!  No role (unauthenticated or not yet resolved): everything ✗
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::UserRole;

/// Boolean permission record for one role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Permissions {
    pub can_view_dashboard: bool,
    pub can_view_employees: bool,
    pub can_manage_employees: bool,
    pub can_view_departments: bool,
    pub can_manage_departments: bool,
    pub can_view_attendance: bool,
    pub can_manage_attendance: bool,
    pub can_view_leave_requests: bool,
    pub can_manage_leave_requests: bool,
    pub can_view_payroll: bool,
    pub can_manage_payroll: bool,
    pub can_view_reports: bool,
    pub can_view_profile: bool,
}

/// Resolves the permission record for `role`.
///
/// ```rust
/// use hrms_core::{resolve_permissions, UserRole};
///
/// let manager = resolve_permissions(Some(UserRole::Manager));
/// assert!(manager.can_view_payroll);
/// assert!(!manager.can_manage_payroll);
/// assert_eq!(resolve_permissions(None), Default::default());
/// ```
pub fn resolve_permissions(role: Option<UserRole>) -> Permissions {
    let Some(role) = role else {
        return Permissions::default();
    };

    let staff = matches!(role, UserRole::Admin | UserRole::Hr | UserRole::Manager);
    let admin_or_hr = matches!(role, UserRole::Admin | UserRole::Hr);

    Permissions {
        can_view_dashboard: true,
        can_view_employees: staff,
        can_manage_employees: admin_or_hr,
        can_view_departments: staff,
        can_manage_departments: admin_or_hr,
        can_view_attendance: true,
        can_manage_attendance: staff,
        can_view_leave_requests: true,
        can_manage_leave_requests: staff,
        can_view_payroll: staff,
        can_manage_payroll: admin_or_hr,
        can_view_reports: staff,
        can_view_profile: true,
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// A single checkable permission, used by service guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewDashboard,
    ViewEmployees,
    ManageEmployees,
    ViewDepartments,
    ManageDepartments,
    ViewAttendance,
    ManageAttendance,
    ViewLeaveRequests,
    ManageLeaveRequests,
    ViewPayroll,
    ManagePayroll,
    ViewReports,
    ViewProfile,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewDashboard => "view dashboard",
            Capability::ViewEmployees => "view employees",
            Capability::ManageEmployees => "manage employees",
            Capability::ViewDepartments => "view departments",
            Capability::ManageDepartments => "manage departments",
            Capability::ViewAttendance => "view attendance",
            Capability::ManageAttendance => "manage attendance",
            Capability::ViewLeaveRequests => "view leave requests",
            Capability::ManageLeaveRequests => "manage leave requests",
            Capability::ViewPayroll => "view payroll",
            Capability::ManagePayroll => "manage payroll",
            Capability::ViewReports => "view reports",
            Capability::ViewProfile => "view profile",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Permissions {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewDashboard => self.can_view_dashboard,
            Capability::ViewEmployees => self.can_view_employees,
            Capability::ManageEmployees => self.can_manage_employees,
            Capability::ViewDepartments => self.can_view_departments,
            Capability::ManageDepartments => self.can_manage_departments,
            Capability::ViewAttendance => self.can_view_attendance,
            Capability::ManageAttendance => self.can_manage_attendance,
            Capability::ViewLeaveRequests => self.can_view_leave_requests,
            Capability::ManageLeaveRequests => self.can_manage_leave_requests,
            Capability::ViewPayroll => self.can_view_payroll,
            Capability::ManagePayroll => self.can_manage_payroll,
            Capability::ViewReports => self.can_view_reports,
            Capability::ViewProfile => self.can_view_profile,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CAPABILITIES: [Capability; 13] = [
        Capability::ViewDashboard,
        Capability::ViewEmployees,
        Capability::ManageEmployees,
        Capability::ViewDepartments,
        Capability::ManageDepartments,
        Capability::ViewAttendance,
        Capability::ManageAttendance,
        Capability::ViewLeaveRequests,
        Capability::ManageLeaveRequests,
        Capability::ViewPayroll,
        Capability::ManagePayroll,
        Capability::ViewReports,
        Capability::ViewProfile,
    ];

    #[test]
    fn test_no_role_denies_everything() {
        let perms = resolve_permissions(None);
        assert!(ALL_CAPABILITIES.iter().all(|c| !perms.allows(*c)));
    }

    #[test]
    fn test_admin_allows_everything() {
        let perms = resolve_permissions(Some(UserRole::Admin));
        assert!(ALL_CAPABILITIES.iter().all(|c| perms.allows(*c)));
    }

    #[test]
    fn test_hr_matches_admin() {
        assert_eq!(
            resolve_permissions(Some(UserRole::Hr)),
            resolve_permissions(Some(UserRole::Admin))
        );
    }

    #[test]
    fn test_manager_permissions() {
        let perms = resolve_permissions(Some(UserRole::Manager));
        assert!(perms.can_view_employees);
        assert!(!perms.can_manage_employees);
        assert!(!perms.can_manage_departments);
        assert!(perms.can_manage_attendance);
        assert!(perms.can_manage_leave_requests);
        assert!(perms.can_view_payroll);
        assert!(!perms.can_manage_payroll);
        assert!(perms.can_view_reports);
    }

    #[test]
    fn test_employee_permissions() {
        let perms = resolve_permissions(Some(UserRole::Employee));
        assert!(perms.can_view_dashboard);
        assert!(perms.can_view_profile);
        assert!(perms.can_view_attendance);
        assert!(!perms.can_manage_attendance);
        assert!(perms.can_view_leave_requests);
        assert!(!perms.can_manage_leave_requests);
        assert!(!perms.can_view_employees);
        assert!(!perms.can_view_payroll);
        assert!(!perms.can_view_reports);
    }

    #[test]
    fn test_manage_implies_view() {
        let pairs = [
            (Capability::ManageEmployees, Capability::ViewEmployees),
            (Capability::ManageDepartments, Capability::ViewDepartments),
            (Capability::ManageAttendance, Capability::ViewAttendance),
            (Capability::ManageLeaveRequests, Capability::ViewLeaveRequests),
            (Capability::ManagePayroll, Capability::ViewPayroll),
        ];
        for role in UserRole::ALL {
            let perms = resolve_permissions(Some(role));
            for (manage, view) in pairs {
                assert!(!perms.allows(manage) || perms.allows(view), "{role}: {manage}");
            }
        }
    }
}
