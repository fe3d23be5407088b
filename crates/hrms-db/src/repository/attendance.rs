//! # Attendance Repository
//!
//! ## Upsert by Natural Key
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO attendance (...) VALUES (...)                              │
//! │  ON CONFLICT (employee_id, date) DO UPDATE SET                          │
//! │      status, marked_by, marked_at  ← always overwritten                 │
//! │      notes                         ← kept unless new notes given        │
//! │  RETURNING *                                                            │
//! │                                                                         │
//! │  The stored row keeps its original id and created_at, so re-marking    │
//! │  never produces a second record for the same employee and day.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use hrms_core::filters::AttendanceFilter;
use hrms_core::Attendance;

const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, date, status, marked_by, marked_at, notes, created_at";

#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    pool: SqlitePool,
}

impl AttendanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AttendanceRepository { pool }
    }

    /// Inserts or overwrites the record for `(employee_id, date)` and returns
    /// the stored row.
    pub async fn upsert(&self, record: &Attendance) -> DbResult<Attendance> {
        debug!(
            employee_id = %record.employee_id,
            date = %record.date,
            status = record.status.as_str(),
            "Upserting attendance"
        );

        let sql = format!(
            r#"
            INSERT INTO attendance ({cols})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (employee_id, date) DO UPDATE SET
                status = excluded.status,
                marked_by = excluded.marked_by,
                marked_at = excluded.marked_at,
                notes = COALESCE(excluded.notes, attendance.notes)
            RETURNING {cols}
            "#,
            cols = ATTENDANCE_COLUMNS
        );

        let stored = sqlx::query_as::<_, Attendance>(&sql)
            .bind(&record.id)
            .bind(&record.employee_id)
            .bind(record.date)
            .bind(record.status)
            .bind(&record.marked_by)
            .bind(record.marked_at)
            .bind(&record.notes)
            .bind(record.created_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(stored)
    }

    pub async fn get(&self, employee_id: &str, date: NaiveDate) -> DbResult<Option<Attendance>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ?1 AND date = ?2",
            ATTENDANCE_COLUMNS
        );
        let record = sqlx::query_as::<_, Attendance>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Lists records matching `filter`, newest day first.
    pub async fn list(&self, filter: &AttendanceFilter) -> DbResult<Vec<Attendance>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM attendance WHERE 1 = 1", ATTENDANCE_COLUMNS));

        if let Some(date) = filter.date {
            query.push(" AND date = ").push_bind(date);
        }
        if let Some(employee_id) = &filter.employee_id {
            query.push(" AND employee_id = ").push_bind(employee_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY date DESC, employee_id");

        let records = query
            .build_query_as::<Attendance>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{date, employee, seeded, ts};
    use hrms_core::attendance::new_record;
    use hrms_core::AttendanceStatus;

    #[tokio::test]
    async fn test_upsert_keeps_one_record_with_latest_status() {
        let db = seeded(&[employee("e1", "EMP-0001", "Meera")]).await;
        let repo = db.attendance();
        let day = date(2024, 5, 6);

        let first = repo
            .upsert(&new_record("e1", day, AttendanceStatus::Present, "hr-1", None, ts(100)))
            .await
            .unwrap();
        let second = repo
            .upsert(&new_record("e1", day, AttendanceStatus::Absent, "mgr-1", None, ts(200)))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.status, AttendanceStatus::Absent);
        assert_eq!(second.marked_by, "mgr-1");
        assert_eq!(second.marked_at, ts(200));
        assert_eq!(second.created_at, ts(100));

        let all = repo.list(&AttendanceFilter::on(day)).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_preserves_notes_when_absent() {
        let db = seeded(&[employee("e1", "EMP-0001", "Meera")]).await;
        let repo = db.attendance();
        let day = date(2024, 5, 7);

        repo.upsert(&new_record(
            "e1",
            day,
            AttendanceStatus::Leave,
            "hr-1",
            Some("doctor".to_string()),
            ts(1),
        ))
        .await
        .unwrap();
        let again = repo
            .upsert(&new_record("e1", day, AttendanceStatus::Leave, "hr-1", None, ts(2)))
            .await
            .unwrap();
        assert_eq!(again.notes.as_deref(), Some("doctor"));
    }

    #[tokio::test]
    async fn test_get_and_filter() {
        let db = seeded(&[
            employee("e1", "EMP-0001", "Meera"),
            employee("e2", "EMP-0002", "Arjun"),
        ])
        .await;
        let repo = db.attendance();
        let mon = date(2024, 5, 6);
        let tue = date(2024, 5, 7);

        repo.upsert(&new_record("e1", mon, AttendanceStatus::Present, "hr", None, ts(1)))
            .await
            .unwrap();
        repo.upsert(&new_record("e2", mon, AttendanceStatus::Absent, "hr", None, ts(1)))
            .await
            .unwrap();
        repo.upsert(&new_record("e1", tue, AttendanceStatus::Present, "hr", None, ts(2)))
            .await
            .unwrap();

        assert!(repo.get("e2", tue).await.unwrap().is_none());
        assert_eq!(
            repo.get("e2", mon).await.unwrap().unwrap().status,
            AttendanceStatus::Absent
        );

        let e1_days = repo
            .list(&AttendanceFilter {
                employee_id: Some("e1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(e1_days.len(), 2);
        assert_eq!(e1_days[0].date, tue);

        let present_mon = repo
            .list(&AttendanceFilter {
                date: Some(mon),
                status: Some(AttendanceStatus::Present),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(present_mon.len(), 1);
    }
}
