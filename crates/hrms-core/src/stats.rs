//! Dashboard aggregates.
//!
//! Per-area counters live next to their rules (`PayrollStats`,
//! `AttendanceStats`, `LeaveStats`); this module rolls them into the
//! headline numbers shown on the dashboard.

use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::payroll::Payroll;
use crate::types::{Attendance, AttendanceStatus, Employee, LeaveRequest, LeaveStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub total_employees: usize,
    pub active_employees: usize,
    pub departments: usize,
    pub pending_leaves: usize,
    pub present_today: usize,
    /// `present_today / active_employees`, rounded to a whole percent.
    pub attendance_rate_percent: u32,
    pub total_net_payroll: Money,
}

impl DashboardSummary {
    pub fn compute(
        employees: &[Employee],
        departments: usize,
        leave_requests: &[LeaveRequest],
        today: &[Attendance],
        payroll: &[Payroll],
    ) -> Self {
        let active_employees = employees.iter().filter(|e| e.is_active()).count();
        let present_today = today
            .iter()
            .filter(|a| a.status == AttendanceStatus::Present)
            .count();

        let attendance_rate_percent = if active_employees == 0 {
            0
        } else {
            ((present_today as u64 * 100 + active_employees as u64 / 2) / active_employees as u64) as u32
        };

        DashboardSummary {
            total_employees: employees.len(),
            active_employees,
            departments,
            pending_leaves: leave_requests
                .iter()
                .filter(|l| l.status == LeaveStatus::Pending)
                .count(),
            present_today,
            attendance_rate_percent,
            total_net_payroll: payroll.iter().map(Payroll::net_pay).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dashboard() {
        let summary = DashboardSummary::compute(&[], 0, &[], &[], &[]);
        assert_eq!(summary, DashboardSummary::default());
        assert_eq!(summary.attendance_rate_percent, 0);
    }
}
