//! # Audit Log Repository
//!
//! Append-only. `details` is stored as JSON text and parsed on the way out.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};
use hrms_core::AuditLog;

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: String,
    user_id: Option<String>,
    action: String,
    resource_type: String,
    resource_id: Option<String>,
    details: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditLog {
    type Error = DbError;

    fn try_from(row: AuditRow) -> DbResult<Self> {
        let details = serde_json::from_str(&row.details).map_err(|e| DbError::decode("details", e))?;
        Ok(AuditLog {
            id: row.id,
            user_id: row.user_id,
            action: row.action,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            details,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    pub async fn insert(&self, entry: &AuditLog) -> DbResult<()> {
        let details =
            serde_json::to_string(&entry.details).map_err(|e| DbError::decode("details", e))?;
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, resource_type, resource_id, details, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(details)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent entries first, optionally narrowed to one resource.
    pub async fn list(
        &self,
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        limit: i64,
    ) -> DbResult<Vec<AuditLog>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, user_id, action, resource_type, resource_id, details, created_at \
             FROM audit_logs WHERE 1 = 1",
        );
        if let Some(resource_type) = resource_type {
            query.push(" AND resource_type = ").push_bind(resource_type.to_string());
        }
        if let Some(resource_id) = resource_id {
            query.push(" AND resource_id = ").push_bind(resource_id.to_string());
        }
        query.push(" ORDER BY created_at DESC, id LIMIT ").push_bind(limit);

        let rows = query.build_query_as::<AuditRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(AuditLog::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, ts};
    use serde_json::json;

    fn entry(id: &str, resource_id: &str, secs: i64) -> AuditLog {
        AuditLog {
            id: id.to_string(),
            user_id: Some("u-admin".to_string()),
            action: "payroll.mark_paid".to_string(),
            resource_type: "payroll".to_string(),
            resource_id: Some(resource_id.to_string()),
            details: json!({ "transaction_id": "TXN1", "net_pay": 57000 }),
            created_at: ts(secs),
        }
    }

    #[tokio::test]
    async fn test_details_survive_storage() {
        let db = database().await;
        let repo = db.audit_logs();
        repo.insert(&entry("a1", "p1", 1)).await.unwrap();
        repo.insert(&entry("a2", "p2", 2)).await.unwrap();

        let all = repo.list(Some("payroll"), None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a2");
        assert_eq!(all[0].details["transaction_id"], "TXN1");

        let one = repo.list(Some("payroll"), Some("p1"), 10).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0], entry("a1", "p1", 1));

        assert_eq!(repo.list(None, None, 1).await.unwrap().len(), 1);
    }
}
