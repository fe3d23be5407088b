//! List filters used by the employee, attendance, leave and payroll pages.
//!
//! Each filter has a `matches` predicate so in-memory stores and tests can
//! apply it directly; the SQLite repositories translate the same fields to
//! `WHERE` clauses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::payroll::{Payroll, PayrollPeriod};
use crate::types::{
    Attendance, AttendanceStatus, Employee, EmployeeStatus, LeaveRequest, LeaveStatus,
    PayrollStatus,
};

// =============================================================================
// Employees
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeFilter {
    /// Case-insensitive match on first name, last name or email.
    pub search: Option<String>,
    pub status: Option<EmployeeStatus>,
    /// Empty means every department.
    pub department_ids: Vec<String>,
}

impl EmployeeFilter {
    pub fn active() -> Self {
        EmployeeFilter {
            status: Some(EmployeeStatus::Active),
            ..Default::default()
        }
    }

    /// Trimmed, lowercased search term, if any.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(status) = self.status {
            if employee.status != status {
                return false;
            }
        }
        if !self.department_ids.is_empty() && !self.department_ids.contains(&employee.department_id) {
            return false;
        }
        match self.search_term() {
            Some(term) => [&employee.first_name, &employee.last_name, &employee.email]
                .iter()
                .any(|field| field.to_lowercase().contains(&term)),
            None => true,
        }
    }
}

// =============================================================================
// Attendance
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttendanceFilter {
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    pub employee_id: Option<String>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceFilter {
    pub fn on(date: NaiveDate) -> Self {
        AttendanceFilter {
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &Attendance) -> bool {
        self.date.map_or(true, |d| record.date == d)
            && self
                .employee_id
                .as_ref()
                .map_or(true, |id| &record.employee_id == id)
            && self.status.map_or(true, |s| record.status == s)
    }
}

// =============================================================================
// Leave
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaveFilter {
    pub employee_id: Option<String>,
    pub status: Option<LeaveStatus>,
}

impl LeaveFilter {
    pub fn pending() -> Self {
        LeaveFilter {
            status: Some(LeaveStatus::Pending),
            ..Default::default()
        }
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id
            .as_ref()
            .map_or(true, |id| &request.employee_id == id)
            && self.status.map_or(true, |s| request.status == s)
    }
}

// =============================================================================
// Payroll
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PayrollFilter {
    pub employee_id: Option<String>,
    pub period: Option<PayrollPeriod>,
    pub status: Option<PayrollStatus>,
}

impl PayrollFilter {
    pub fn for_period(period: PayrollPeriod) -> Self {
        PayrollFilter {
            period: Some(period),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &Payroll) -> bool {
        self.employee_id
            .as_deref()
            .map_or(true, |id| record.employee_id() == id)
            && self.period.map_or(true, |p| record.period() == p)
            && self.status.map_or(true, |s| record.status() == s)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::payroll::PayrollComponents;
    use crate::types::EmployeeType;
    use chrono::{TimeZone, Utc};

    fn employee(first: &str, email: &str, dept: &str, status: EmployeeStatus) -> Employee {
        Employee {
            id: email.to_string(),
            employee_code: "EMP-0001".to_string(),
            user_id: None,
            first_name: first.to_string(),
            last_name: "Sharma".to_string(),
            email: email.to_string(),
            phone: String::new(),
            photo_url: None,
            department_id: dept.to_string(),
            role_id: "role".to_string(),
            date_of_birth: None,
            address: None,
            join_date: NaiveDate::from_ymd_opt(2022, 4, 1).unwrap(),
            status,
            salary_monthly: Money::zero(),
            bank_account: None,
            ifsc_code: None,
            employee_type: EmployeeType::Permanent,
            emergency_contact: None,
            created_by: None,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
            updated_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn test_employee_search_is_case_insensitive() {
        let e = employee("Meera", "meera@acme.io", "eng", EmployeeStatus::Active);
        let filter = EmployeeFilter {
            search: Some("  MEE ".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&e));

        let by_last_name = EmployeeFilter {
            search: Some("sharma".to_string()),
            ..Default::default()
        };
        assert!(by_last_name.matches(&e));

        let miss = EmployeeFilter {
            search: Some("zzz".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&e));
    }

    #[test]
    fn test_employee_status_and_department() {
        let e = employee("Meera", "meera@acme.io", "eng", EmployeeStatus::Inactive);
        assert!(!EmployeeFilter::active().matches(&e));

        let filter = EmployeeFilter {
            department_ids: vec!["ops".to_string(), "eng".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&e));

        let other = EmployeeFilter {
            department_ids: vec!["ops".to_string()],
            ..Default::default()
        };
        assert!(!other.matches(&e));
    }

    #[test]
    fn test_payroll_filter() {
        let nov = PayrollPeriod::new(2024, 11).unwrap();
        let dec = PayrollPeriod::new(2024, 12).unwrap();
        let record = Payroll::generate(
            "emp-1",
            nov,
            PayrollComponents::default(),
            "admin",
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap();

        assert!(PayrollFilter::for_period(nov).matches(&record));
        assert!(!PayrollFilter::for_period(dec).matches(&record));
        assert!(!PayrollFilter {
            status: Some(PayrollStatus::Paid),
            ..Default::default()
        }
        .matches(&record));
    }
}
