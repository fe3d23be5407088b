//! # Department Repository
//!
//! Database operations for departments.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use hrms_core::Department;

#[derive(Debug, Clone)]
pub struct DepartmentRepository {
    pool: SqlitePool,
}

impl DepartmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DepartmentRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Department>> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, manager_id, created_at, updated_at FROM departments WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    /// Lists all departments by name.
    pub async fn list(&self) -> DbResult<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT id, name, manager_id, created_at, updated_at FROM departments ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    pub async fn insert(&self, department: &Department) -> DbResult<()> {
        debug!(name = %department.name, "Inserting department");

        sqlx::query(
            r#"
            INSERT INTO departments (id, name, manager_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&department.id)
        .bind(&department.name)
        .bind(&department.manager_id)
        .bind(department.created_at)
        .bind(department.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates name and manager.
    pub async fn update(&self, department: &Department) -> DbResult<()> {
        debug!(id = %department.id, "Updating department");

        let result = sqlx::query(
            "UPDATE departments SET name = ?2, manager_id = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&department.id)
        .bind(&department.name)
        .bind(&department.manager_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Department", &department.id));
        }
        Ok(())
    }

    /// Deletes a department. Callers check references first; the foreign
    /// keys on `roles` and `employees` reject the delete otherwise.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting department");

        let result = sqlx::query("DELETE FROM departments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Department", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
