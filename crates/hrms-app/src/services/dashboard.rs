//! Dashboard headline numbers, gathered from the store and rolled up by
//! `hrms_core::stats::DashboardSummary`.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use super::Actor;
use crate::error::AppResult;
use crate::store::Store;
use hrms_core::filters::{AttendanceFilter, EmployeeFilter, LeaveFilter, PayrollFilter};
use hrms_core::stats::DashboardSummary;
use hrms_core::Capability;

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn Store>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        DashboardService { store }
    }

    pub async fn summary(&self, actor: &Actor, today: NaiveDate) -> AppResult<DashboardSummary> {
        actor.require(Capability::ViewReports)?;

        let employees = self.store.list_employees(&EmployeeFilter::default()).await?;
        let departments = self.store.list_departments().await?.len();
        let pending = self.store.list_leaves(&LeaveFilter::pending()).await?;
        let attendance = self.store.list_attendance(&AttendanceFilter::on(today)).await?;
        let payroll = self.store.list_payroll(&PayrollFilter::default()).await?;

        let summary = DashboardSummary::compute(&employees, departments, &pending, &attendance, &payroll);
        debug!(?summary, "Dashboard summary computed");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ActivityLog, AttendanceService};
    use crate::testing::{employee, seeded_memory};
    use hrms_core::{AttendanceStatus, EmployeeStatus, UserRole};

    #[tokio::test]
    async fn test_summary_counts() {
        let mut gone = employee("e3", "EMP-0003", "Kabir");
        gone.status = EmployeeStatus::Inactive;
        let store: Arc<dyn Store> = Arc::new(
            seeded_memory(&[
                employee("e1", "EMP-0001", "Meera"),
                employee("e2", "EMP-0002", "Arjun"),
                gone,
            ])
            .await,
        );
        let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let admin = Actor::new("u-admin", Some(UserRole::Admin));
        AttendanceService::new(store.clone(), ActivityLog::new(store.clone()))
            .mark(&admin, "e1", today, AttendanceStatus::Present, None)
            .await
            .unwrap();

        let service = DashboardService::new(store);
        let summary = service.summary(&admin, today).await.unwrap();
        assert_eq!(summary.total_employees, 3);
        assert_eq!(summary.active_employees, 2);
        assert_eq!(summary.departments, 1);
        assert_eq!(summary.present_today, 1);
        assert_eq!(summary.attendance_rate_percent, 50);

        let employee = Actor::new("u-e", Some(UserRole::Employee));
        assert!(service.summary(&employee, today).await.is_err());
    }
}
