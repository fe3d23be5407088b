//! # Notification Repository

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};
use hrms_core::Notification;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, kind, related_type, related_id, is_read, created_at";

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    pub async fn insert(&self, notification: &Notification) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO notifications ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            NOTIFICATION_COLUMNS
        );
        sqlx::query(&sql)
            .bind(&notification.id)
            .bind(&notification.user_id)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.kind)
            .bind(&notification.related_type)
            .bind(&notification.related_id)
            .bind(notification.is_read)
            .bind(notification.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(&self, user_id: &str, unread_only: bool) -> DbResult<Vec<Notification>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM notifications WHERE user_id = ",
            NOTIFICATION_COLUMNS
        ));
        query.push_bind(user_id.to_string());
        if unread_only {
            query.push(" AND is_read = 0");
        }
        query.push(" ORDER BY created_at DESC, id");

        let rows = query
            .build_query_as::<Notification>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn mark_read(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, ts};
    use hrms_core::NotificationKind;

    fn notification(id: &str, secs: i64) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: "Leave approved".to_string(),
            message: "Your leave from 2024-06-03 was approved".to_string(),
            kind: NotificationKind::Success,
            related_type: Some("leave_request".to_string()),
            related_id: Some("lr-1".to_string()),
            is_read: false,
            created_at: ts(secs),
        }
    }

    #[tokio::test]
    async fn test_unread_listing() {
        let db = database().await;
        let repo = db.notifications();
        repo.insert(&notification("n1", 1)).await.unwrap();
        repo.insert(&notification("n2", 2)).await.unwrap();

        repo.mark_read("n1").await.unwrap();

        let all = repo.list_for_user("u1", false).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "n2");
        assert!(all[1].is_read);

        let unread = repo.list_for_user("u1", true).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::Success);

        assert!(matches!(repo.mark_read("missing").await, Err(DbError::NotFound { .. })));
    }
}
