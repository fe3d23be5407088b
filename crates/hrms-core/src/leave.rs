//! # Leave Requests
//!
//! Submission and the one-shot approval state machine.
//!
//! ```text
//!                 ┌──approve(approver, comment)──► approved
//! submit ──► pending
//!                 └──reject(approver, comment)───► rejected
//!
//! approved / rejected are terminal: any further decision fails with
//! CoreError::InvalidStateTransition.
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{LeaveRequest, LeaveStatus, LeaveType};
use crate::validation::{validate_date_range, validate_required};
use crate::{DEFAULT_APPROVE_COMMENT, DEFAULT_REJECT_COMMENT};

/// What an employee fills in to request leave.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaveApplication {
    pub employee_id: String,
    pub leave_type: LeaveType,
    #[ts(as = "String")]
    pub from_date: NaiveDate,
    #[ts(as = "String")]
    pub to_date: NaiveDate,
    pub reason: String,
    pub attachment_url: Option<String>,
}

/// Creates a pending request; `total_days` is the inclusive span.
pub fn submit(application: LeaveApplication, now: DateTime<Utc>) -> CoreResult<LeaveRequest> {
    validate_required("employee_id", &application.employee_id)?;
    validate_required("reason", &application.reason)?;
    let total_days = validate_date_range(application.from_date, application.to_date)?;

    Ok(LeaveRequest {
        id: Uuid::new_v4().to_string(),
        employee_id: application.employee_id,
        leave_type: application.leave_type,
        from_date: application.from_date,
        to_date: application.to_date,
        total_days,
        reason: application.reason.trim().to_string(),
        attachment_url: application.attachment_url,
        status: LeaveStatus::Pending,
        approver_id: None,
        approver_comment: None,
        created_at: now,
        updated_at: now,
    })
}

/// Approves a pending request. A blank comment becomes `"Approved"`.
pub fn approve(
    request: &mut LeaveRequest,
    approver_id: &str,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    decide(request, LeaveStatus::Approved, approver_id, comment, now)
}

/// Rejects a pending request. A blank comment becomes `"Rejected"`.
pub fn reject(
    request: &mut LeaveRequest,
    approver_id: &str,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    decide(request, LeaveStatus::Rejected, approver_id, comment, now)
}

fn decide(
    request: &mut LeaveRequest,
    outcome: LeaveStatus,
    approver_id: &str,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    let (action, fallback) = match outcome {
        LeaveStatus::Approved => ("approve", DEFAULT_APPROVE_COMMENT),
        _ => ("reject", DEFAULT_REJECT_COMMENT),
    };

    if request.status != LeaveStatus::Pending {
        return Err(CoreError::invalid_transition(
            "Leave request",
            &request.id,
            request.status.as_str(),
            action,
        ));
    }

    let comment = comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(fallback);

    request.status = outcome;
    request.approver_id = Some(approver_id.to_string());
    request.approver_comment = Some(comment.to_string());
    request.updated_at = now;
    Ok(())
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct LeaveStats {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl LeaveStats {
    pub fn from_requests<'a>(requests: impl IntoIterator<Item = &'a LeaveRequest>) -> Self {
        requests
            .into_iter()
            .fold(LeaveStats::default(), |mut stats, request| {
                match request.status {
                    LeaveStatus::Pending => stats.pending += 1,
                    LeaveStatus::Approved => stats.approved += 1,
                    LeaveStatus::Rejected => stats.rejected += 1,
                }
                stats
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn application(from: u32, to: u32) -> LeaveApplication {
        LeaveApplication {
            employee_id: "emp-1".to_string(),
            leave_type: LeaveType::Casual,
            from_date: day(from),
            to_date: day(to),
            reason: "Family event".to_string(),
            attachment_url: None,
        }
    }

    #[test]
    fn test_submit_derives_total_days() {
        let request = submit(application(6, 10), at(0)).unwrap();
        assert_eq!(request.status, LeaveStatus::Pending);
        assert_eq!(request.total_days, 5);
        assert!(request.approver_id.is_none());
    }

    #[test]
    fn test_submit_rejects_reversed_range() {
        let err = submit(application(10, 6), at(0)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_submit_requires_reason() {
        let mut app = application(6, 6);
        app.reason = "   ".to_string();
        assert!(submit(app, at(0)).is_err());
    }

    #[test]
    fn test_approve_with_default_comment() {
        let mut request = submit(application(6, 7), at(0)).unwrap();
        approve(&mut request, "mgr-1", None, at(60)).unwrap();
        assert_eq!(request.status, LeaveStatus::Approved);
        assert_eq!(request.approver_id.as_deref(), Some("mgr-1"));
        assert_eq!(request.approver_comment.as_deref(), Some("Approved"));
        assert_eq!(request.updated_at, at(60));
    }

    #[test]
    fn test_reject_with_blank_comment_uses_default() {
        let mut request = submit(application(6, 7), at(0)).unwrap();
        reject(&mut request, "hr-1", Some("  "), at(60)).unwrap();
        assert_eq!(request.status, LeaveStatus::Rejected);
        assert_eq!(request.approver_comment.as_deref(), Some("Rejected"));
    }

    #[test]
    fn test_decisions_are_one_shot() {
        let mut request = submit(application(6, 7), at(0)).unwrap();
        approve(&mut request, "mgr-1", Some("Enjoy"), at(60)).unwrap();

        let err = reject(&mut request, "hr-1", None, at(120)).unwrap_err();
        assert!(err.is_invalid_transition());
        let err = approve(&mut request, "hr-1", None, at(120)).unwrap_err();
        assert!(err.is_invalid_transition());

        assert_eq!(request.status, LeaveStatus::Approved);
        assert_eq!(request.approver_comment.as_deref(), Some("Enjoy"));
        assert_eq!(request.updated_at, at(60));
    }

    #[test]
    fn test_leave_stats() {
        let pending = submit(application(1, 1), at(0)).unwrap();
        let mut approved = submit(application(2, 2), at(0)).unwrap();
        approve(&mut approved, "mgr", None, at(1)).unwrap();
        let mut rejected = submit(application(3, 3), at(0)).unwrap();
        reject(&mut rejected, "mgr", None, at(1)).unwrap();

        let stats = LeaveStats::from_requests([&pending, &approved, &rejected, &pending]);
        assert_eq!(
            stats,
            LeaveStats {
                pending: 2,
                approved: 1,
                rejected: 1
            }
        );
    }
}
