//! # Attendance Marking
//!
//! Rules for the one-record-per-(employee, date) attendance sheet.
//!
//! ```text
//! mark(emp, 2024-05-06, present)  ──► insert  { status: present }
//! mark(emp, 2024-05-06, absent)   ──► update  { status: absent, marked_by, marked_at }
//!                                      (same id, still one record)
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Attendance, AttendanceStatus, Employee};

/// Checks that `employee` can be marked with `status`.
pub fn check_markable(employee: &Employee, status: AttendanceStatus) -> CoreResult<()> {
    if !status.is_markable() {
        return Err(ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec![
                AttendanceStatus::Present.as_str().to_string(),
                AttendanceStatus::Absent.as_str().to_string(),
                AttendanceStatus::Leave.as_str().to_string(),
            ],
        }
        .into());
    }
    if !employee.is_active() {
        return Err(CoreError::InactiveEmployee(employee.id.clone()));
    }
    Ok(())
}

/// Builds a fresh record for the first mark of the day.
pub fn new_record(
    employee_id: &str,
    date: NaiveDate,
    status: AttendanceStatus,
    marked_by: &str,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Attendance {
    Attendance {
        id: Uuid::new_v4().to_string(),
        employee_id: employee_id.to_string(),
        date,
        status,
        marked_by: marked_by.to_string(),
        marked_at: now,
        notes,
        created_at: now,
    }
}

/// Overwrites status and marker on an existing record. Notes are replaced
/// only when new ones are given.
pub fn remark(
    record: &mut Attendance,
    status: AttendanceStatus,
    marked_by: &str,
    notes: Option<String>,
    now: DateTime<Utc>,
) {
    record.status = status;
    record.marked_by = marked_by.to_string();
    record.marked_at = now;
    if notes.is_some() {
        record.notes = notes;
    }
}

// =============================================================================
// Bulk Marking
// =============================================================================

/// One employee that could not be marked in a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BulkMarkFailure {
    pub employee_id: String,
    pub reason: String,
}

/// Outcome of marking many employees at once. A failure never stops the
/// rest of the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BulkMarkReport {
    pub marked: Vec<Attendance>,
    pub failures: Vec<BulkMarkFailure>,
}

impl BulkMarkReport {
    pub fn record_success(&mut self, record: Attendance) {
        self.marked.push(record);
    }

    pub fn record_failure(&mut self, employee_id: impl Into<String>, reason: impl ToString) {
        self.failures.push(BulkMarkFailure {
            employee_id: employee_id.into(),
            reason: reason.to_string(),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Daily attendance counters over active employees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct AttendanceStats {
    pub present: usize,
    pub absent: usize,
    pub on_leave: usize,
    pub not_marked: usize,
}

impl AttendanceStats {
    /// Counts one day's records against the active headcount.
    ///
    /// `half_day` and `late` records count as present.
    pub fn for_day(employees: &[Employee], records: &[Attendance]) -> Self {
        let active: HashSet<&str> = employees
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.id.as_str())
            .collect();

        let by_employee: HashMap<&str, AttendanceStatus> = records
            .iter()
            .filter(|r| active.contains(r.employee_id.as_str()))
            .map(|r| (r.employee_id.as_str(), r.status))
            .collect();

        let mut stats = AttendanceStats::default();
        for status in by_employee.values() {
            match status {
                AttendanceStatus::Absent => stats.absent += 1,
                AttendanceStatus::Leave => stats.on_leave += 1,
                AttendanceStatus::Present | AttendanceStatus::HalfDay | AttendanceStatus::Late => {
                    stats.present += 1
                }
            }
        }
        stats.not_marked = active.len() - by_employee.len();
        stats
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
