//! # Role Repository
//!
//! Job titles, each scoped to one department.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use hrms_core::Role;

#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoleRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, department_id, name, description, created_at FROM roles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    /// Lists roles, optionally only those of one department. This is what
    /// the employee form uses to offer role choices per department.
    pub async fn list(&self, department_id: Option<&str>) -> DbResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, department_id, name, description, created_at
            FROM roles
            WHERE ?1 IS NULL OR department_id = ?1
            ORDER BY name
            "#,
        )
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn insert(&self, role: &Role) -> DbResult<()> {
        debug!(name = %role.name, department = %role.department_id, "Inserting role");

        sqlx::query(
            r#"
            INSERT INTO roles (id, department_id, name, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&role.id)
        .bind(&role.department_id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Role", id));
        }
        Ok(())
    }

    pub async fn count_in_department(&self, department_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE department_id = ?1")
            .bind(department_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{department, role, seeded};

    #[tokio::test]
    async fn test_list_by_department() {
        let db = seeded(&[]).await;
        db.departments().insert(&department("dept-2", "Sales")).await.unwrap();
        db.roles().insert(&role("role-2", "dept-2")).await.unwrap();
        db.roles().insert(&role("role-3", "dept-2")).await.unwrap();

        assert_eq!(db.roles().list(None).await.unwrap().len(), 3);
        assert_eq!(db.roles().list(Some("dept-2")).await.unwrap().len(), 2);
        assert_eq!(db.roles().count_in_department("dept-1").await.unwrap(), 1);

        let found = db.roles().get_by_id("role-2").await.unwrap().unwrap();
        assert_eq!(found.department_id, "dept-2");
    }

    #[tokio::test]
    async fn test_role_requires_department() {
        let db = seeded(&[]).await;
        let err = db.roles().insert(&role("role-x", "dept-404")).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
