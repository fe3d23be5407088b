//! # Leave Request Repository
//!
//! Decisions are written with a conditional update so two approvers racing
//! on the same request cannot both win:
//!
//! ```text
//! UPDATE leave_requests SET status = 'approved', ...
//! WHERE id = ?1 AND status = 'pending'
//!        │
//!        ├── 1 row  → decision recorded
//!        └── 0 rows → DbError::StateConflict (someone decided first)
//! ```

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use hrms_core::filters::LeaveFilter;
use hrms_core::{LeaveRequest, LeaveStatus};

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, leave_type, from_date, to_date, total_days, reason,
    attachment_url, status, approver_id, approver_comment, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct LeaveRepository {
    pool: SqlitePool,
}

impl LeaveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LeaveRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?1", LEAVE_COLUMNS);
        let request = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(request)
    }

    /// Lists requests matching `filter`, newest first.
    pub async fn list(&self, filter: &LeaveFilter) -> DbResult<Vec<LeaveRequest>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM leave_requests WHERE 1 = 1", LEAVE_COLUMNS));
        if let Some(employee_id) = &filter.employee_id {
            query.push(" AND employee_id = ").push_bind(employee_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY created_at DESC");

        let requests = query
            .build_query_as::<LeaveRequest>()
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    pub async fn insert(&self, request: &LeaveRequest) -> DbResult<()> {
        debug!(employee_id = %request.employee_id, days = request.total_days, "Inserting leave request");

        let sql = format!(
            "INSERT INTO leave_requests ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            LEAVE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(&request.id)
            .bind(&request.employee_id)
            .bind(request.leave_type)
            .bind(request.from_date)
            .bind(request.to_date)
            .bind(request.total_days)
            .bind(&request.reason)
            .bind(&request.attachment_url)
            .bind(request.status)
            .bind(&request.approver_id)
            .bind(&request.approver_comment)
            .bind(request.created_at)
            .bind(request.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persists an approve/reject decision made on a pending request.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such request
    /// * `Err(DbError::StateConflict)` - the stored request is no longer pending
    pub async fn record_decision(&self, decided: &LeaveRequest) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests SET
                status = ?2,
                approver_id = ?3,
                approver_comment = ?4,
                updated_at = ?5
            WHERE id = ?1 AND status = ?6
            "#,
        )
        .bind(&decided.id)
        .bind(decided.status)
        .bind(&decided.approver_id)
        .bind(&decided.approver_comment)
        .bind(decided.updated_at)
        .bind(LeaveStatus::Pending)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(&decided.id).await? {
                Some(_) => Err(DbError::state_conflict(
                    "Leave request",
                    &decided.id,
                    LeaveStatus::Pending.as_str(),
                )),
                None => Err(DbError::not_found("Leave request", &decided.id)),
            };
        }

        info!(id = %decided.id, status = decided.status.as_str(), "Leave request decided");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{date, employee, seeded, ts};
    use hrms_core::leave::{approve, reject, submit, LeaveApplication};
    use hrms_core::LeaveType;

    fn application() -> LeaveApplication {
        LeaveApplication {
            employee_id: "e1".to_string(),
            leave_type: LeaveType::Medical,
            from_date: date(2024, 6, 3),
            to_date: date(2024, 6, 5),
            reason: "Surgery".to_string(),
            attachment_url: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_decide() {
        let db = seeded(&[employee("e1", "EMP-0001", "Meera")]).await;
        let repo = db.leave_requests();

        let mut request = submit(application(), ts(0)).unwrap();
        repo.insert(&request).await.unwrap();

        approve(&mut request, "mgr-1", None, ts(10)).unwrap();
        repo.record_decision(&request).await.unwrap();

        let stored = repo.get_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Approved);
        assert_eq!(stored.total_days, 3);
        assert_eq!(stored.approver_comment.as_deref(), Some("Approved"));
    }

    #[tokio::test]
    async fn test_second_decision_conflicts() {
        let db = seeded(&[employee("e1", "EMP-0001", "Meera")]).await;
        let repo = db.leave_requests();

        let original = submit(application(), ts(0)).unwrap();
        repo.insert(&original).await.unwrap();

        // Two approvers both loaded the pending request
        let mut first = original.clone();
        let mut second = original.clone();
        approve(&mut first, "mgr-1", None, ts(10)).unwrap();
        reject(&mut second, "hr-1", None, ts(11)).unwrap();

        repo.record_decision(&first).await.unwrap();
        let err = repo.record_decision(&second).await.unwrap_err();
        assert!(matches!(err, DbError::StateConflict { .. }));

        let stored = repo.get_by_id(&original.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Approved);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = seeded(&[employee("e1", "EMP-0001", "Meera")]).await;
        let repo = db.leave_requests();

        let pending = submit(application(), ts(0)).unwrap();
        let mut decided = submit(application(), ts(1)).unwrap();
        repo.insert(&pending).await.unwrap();
        repo.insert(&decided).await.unwrap();
        reject(&mut decided, "hr", Some("Busy quarter"), ts(2)).unwrap();
        repo.record_decision(&decided).await.unwrap();

        assert_eq!(repo.list(&LeaveFilter::default()).await.unwrap().len(), 2);
        let only_pending = repo.list(&LeaveFilter::pending()).await.unwrap();
        assert_eq!(only_pending.len(), 1);
        assert_eq!(only_pending[0].id, pending.id);
    }
}
