//! # Attendance Service
//!
//! One record per employee per day. Marking again overwrites the status and
//! the marker; it never adds a second record.
//!
//! Bulk marking treats every employee independently:
//!
//! ```text
//! mark_bulk([e1, e2, e9], 2024-05-06, present)
//!   e1 ✓ marked
//!   e2 ✗ inactive        ──► failures
//!   e9 ✗ not found       ──► failures
//!   → BulkMarkReport { marked: [e1], failures: [e2, e9] }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{info, warn};

use super::{ActivityLog, Actor};
use crate::error::AppResult;
use crate::store::Store;
use hrms_core::attendance::{check_markable, new_record, AttendanceStats, BulkMarkReport};
use hrms_core::filters::{AttendanceFilter, EmployeeFilter};
use hrms_core::{Attendance, AttendanceStatus, Capability, CoreError};

#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn Store>,
    log: ActivityLog,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn Store>, log: ActivityLog) -> Self {
        AttendanceService { store, log }
    }

    /// Marks one employee for `date`, creating or overwriting the record.
    pub async fn mark(
        &self,
        actor: &Actor,
        employee_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> AppResult<Attendance> {
        actor.require(Capability::ManageAttendance)?;
        let stored = self.mark_one(actor, employee_id, date, status, notes).await?;

        self.log
            .record(
                actor,
                "attendance.mark",
                "attendance",
                Some(stored.id.as_str()),
                json!({ "employee_id": employee_id, "date": date, "status": status.as_str() }),
            )
            .await;
        Ok(stored)
    }

    /// Marks every listed employee once, in first-seen order. A failure for
    /// one employee is collected in the report and does not stop the rest.
    pub async fn mark_bulk(
        &self,
        actor: &Actor,
        employee_ids: &[String],
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> AppResult<BulkMarkReport> {
        actor.require(Capability::ManageAttendance)?;

        let mut seen: HashSet<&str> = HashSet::new();
        let mut report = BulkMarkReport::default();
        for employee_id in employee_ids {
            if !seen.insert(employee_id.as_str()) {
                continue;
            }
            match self.mark_one(actor, employee_id, date, status, None).await {
                Ok(record) => report.record_success(record),
                Err(e) => {
                    warn!(employee_id = %employee_id, date = %date, error = %e, "Bulk attendance mark failed");
                    report.record_failure(employee_id.as_str(), e);
                }
            }
        }

        info!(
            date = %date,
            status = status.as_str(),
            marked = report.marked.len(),
            failed = report.failures.len(),
            "Bulk attendance marked"
        );
        self.log
            .record(
                actor,
                "attendance.mark_bulk",
                "attendance",
                None,
                json!({
                    "date": date,
                    "status": status.as_str(),
                    "marked": report.marked.len(),
                    "failed": report.failures.len(),
                }),
            )
            .await;
        Ok(report)
    }

    async fn mark_one(
        &self,
        actor: &Actor,
        employee_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> AppResult<Attendance> {
        let employee = self
            .store
            .get_employee(employee_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee", employee_id))?;
        check_markable(&employee, status)?;

        let record = new_record(employee_id, date, status, &actor.user_id, notes, Utc::now());
        Ok(self.store.upsert_attendance(&record).await?)
    }

    /// Lists records. Actors who cannot manage attendance only see their own.
    pub async fn list(&self, actor: &Actor, filter: &AttendanceFilter) -> AppResult<Vec<Attendance>> {
        actor.require(Capability::ViewAttendance)?;
        if actor.can(Capability::ManageAttendance) {
            return Ok(self.store.list_attendance(filter).await?);
        }

        let Some(own_id) = actor.employee_id.clone() else {
            return Ok(Vec::new());
        };
        let scoped = AttendanceFilter {
            employee_id: Some(own_id),
            ..filter.clone()
        };
        Ok(self.store.list_attendance(&scoped).await?)
    }

    /// Present / absent / on leave / not marked counts for `date`.
    pub async fn day_stats(&self, actor: &Actor, date: NaiveDate) -> AppResult<AttendanceStats> {
        actor.require(Capability::ManageAttendance)?;
        let employees = self.store.list_employees(&EmployeeFilter::active()).await?;
        let records = self.store.list_attendance(&AttendanceFilter::on(date)).await?;
        Ok(AttendanceStats::for_day(&employees, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{employee, seeded_memory};
    use hrms_core::{EmployeeStatus, UserRole};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    async fn service(employees: &[hrms_core::Employee]) -> AttendanceService {
        let store: Arc<dyn Store> = Arc::new(seeded_memory(employees).await);
        AttendanceService::new(store.clone(), ActivityLog::new(store))
    }

    fn manager() -> Actor {
        Actor::new("u-mgr", Some(UserRole::Manager))
    }

    #[tokio::test]
    async fn test_remark_overwrites_single_record() {
        let service = service(&[employee("e1", "EMP-0001", "Meera")]).await;

        service
            .mark(&manager(), "e1", day(), AttendanceStatus::Present, None)
            .await
            .unwrap();
        let hr = Actor::new("u-hr", Some(UserRole::Hr));
        let second = service
            .mark(&hr, "e1", day(), AttendanceStatus::Leave, Some("sick".into()))
            .await
            .unwrap();

        let records = service.list(&hr, &AttendanceFilter::on(day())).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[0].status, AttendanceStatus::Leave);
        assert_eq!(records[0].marked_by, "u-hr");
    }

    #[tokio::test]
    async fn test_bulk_collects_failures() {
        let mut gone = employee("e2", "EMP-0002", "Arjun");
        gone.status = EmployeeStatus::Inactive;
        let service = service(&[employee("e1", "EMP-0001", "Meera"), gone]).await;

        let ids = vec!["e1".to_string(), "e2".to_string(), "e9".to_string()];
        let report = service
            .mark_bulk(&manager(), &ids, day(), AttendanceStatus::Present)
            .await
            .unwrap();

        assert_eq!(report.marked.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert!(!report.is_complete());
        assert_eq!(report.failures[0].employee_id, "e2");
        assert_eq!(report.failures[1].employee_id, "e9");
        assert!(report.failures[1].reason.contains("not found"));
    }

    #[tokio::test]
    async fn test_bulk_marks_repeated_id_once() {
        let service = service(&[
            employee("e1", "EMP-0001", "Meera"),
            employee("e2", "EMP-0002", "Arjun"),
        ])
        .await;

        let ids = vec!["e1".to_string(), "e2".to_string(), "e1".to_string()];
        let report = service
            .mark_bulk(&manager(), &ids, day(), AttendanceStatus::Present)
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.marked.len(), 2);
        assert_eq!(report.marked[0].employee_id, "e1");
        assert_eq!(report.marked[1].employee_id, "e2");
        let records = service.list(&manager(), &AttendanceFilter::on(day())).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_reserved_status_rejected() {
        let service = service(&[employee("e1", "EMP-0001", "Meera")]).await;
        let err = service
            .mark(&manager(), "e1", day(), AttendanceStatus::HalfDay, None)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::AppError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_employee_sees_only_own_records() {
        let service = service(&[
            employee("e1", "EMP-0001", "Meera"),
            employee("e2", "EMP-0002", "Arjun"),
        ])
        .await;
        let ids = vec!["e1".to_string(), "e2".to_string()];
        service
            .mark_bulk(&manager(), &ids, day(), AttendanceStatus::Present)
            .await
            .unwrap();

        let meera = Actor::new("u-meera", Some(UserRole::Employee)).with_employee("e1");
        let own = service.list(&meera, &AttendanceFilter::default()).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].employee_id, "e1");

        assert!(service
            .mark(&meera, "e1", day(), AttendanceStatus::Present, None)
            .await
            .is_err());

        let stats = service.day_stats(&manager(), day()).await.unwrap();
        assert_eq!(stats.present, 2);
        assert_eq!(stats.not_marked, 0);
    }
}
