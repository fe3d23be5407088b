//! # Employee Repository
//!
//! Database operations for employees.
//!
//! ## Filtering
//! ```text
//! EmployeeFilter { search: "mee", status: active, department_ids: [eng, ops] }
//!      │
//!      ▼
//! SELECT ... FROM employees
//! WHERE status = 'active'
//!   AND department_id IN ('eng', 'ops')
//!   AND (lower(first_name) LIKE '%mee%' OR lower(last_name) LIKE ... OR lower(email) LIKE ...)
//! ORDER BY last_name, first_name
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use hrms_core::filters::EmployeeFilter;
use hrms_core::Employee;

const SELECT_EMPLOYEES: &str = r#"
    SELECT
        id, employee_code, user_id, first_name, last_name, email, phone,
        photo_url, department_id, role_id, date_of_birth, address, join_date,
        status, salary_monthly, bank_account, ifsc_code, employee_type,
        emergency_contact, created_by, created_at, updated_at
    FROM employees
"#;

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Gets an employee by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let sql = format!("{} WHERE id = ?1", SELECT_EMPLOYEES);
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    /// Gets the employee linked to an identity-provider user.
    pub async fn get_by_user_id(&self, user_id: &str) -> DbResult<Option<Employee>> {
        let sql = format!("{} WHERE user_id = ?1", SELECT_EMPLOYEES);
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    /// Lists employees matching `filter`, ordered by name.
    pub async fn list(&self, filter: &EmployeeFilter) -> DbResult<Vec<Employee>> {
        debug!(?filter, "Listing employees");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_EMPLOYEES);
        query.push(" WHERE 1 = 1");

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }

        if !filter.department_ids.is_empty() {
            query.push(" AND department_id IN (");
            let mut ids = query.separated(", ");
            for id in &filter.department_ids {
                ids.push_bind(id.clone());
            }
            ids.push_unseparated(")");
        }

        if let Some(term) = filter.search_term() {
            let pattern = format!("%{}%", term);
            query
                .push(" AND (lower(first_name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(last_name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(email) LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query.push(" ORDER BY last_name, first_name");

        let employees = query
            .build_query_as::<Employee>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = employees.len(), "Employee list returned");
        Ok(employees)
    }

    /// Inserts a new employee.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code, email or user already used
    /// * `Err(DbError::ForeignKeyViolation)` - unknown department or role
    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(code = %employee.employee_code, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, employee_code, user_id, first_name, last_name, email, phone,
                photo_url, department_id, role_id, date_of_birth, address, join_date,
                status, salary_monthly, bank_account, ifsc_code, employee_type,
                emergency_contact, created_by, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18,
                ?19, ?20, ?21, ?22
            )
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.employee_code)
        .bind(&employee.user_id)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.photo_url)
        .bind(&employee.department_id)
        .bind(&employee.role_id)
        .bind(employee.date_of_birth)
        .bind(&employee.address)
        .bind(employee.join_date)
        .bind(employee.status)
        .bind(employee.salary_monthly)
        .bind(&employee.bank_account)
        .bind(&employee.ifsc_code)
        .bind(employee.employee_type)
        .bind(&employee.emergency_contact)
        .bind(&employee.created_by)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates every mutable column of an employee and stamps `updated_at`.
    pub async fn update(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, "Updating employee");

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                user_id = ?2,
                first_name = ?3,
                last_name = ?4,
                email = ?5,
                phone = ?6,
                photo_url = ?7,
                department_id = ?8,
                role_id = ?9,
                date_of_birth = ?10,
                address = ?11,
                join_date = ?12,
                status = ?13,
                salary_monthly = ?14,
                bank_account = ?15,
                ifsc_code = ?16,
                employee_type = ?17,
                emergency_contact = ?18,
                updated_at = ?19
            WHERE id = ?1
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.user_id)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.photo_url)
        .bind(&employee.department_id)
        .bind(&employee.role_id)
        .bind(employee.date_of_birth)
        .bind(&employee.address)
        .bind(employee.join_date)
        .bind(employee.status)
        .bind(employee.salary_monthly)
        .bind(&employee.bank_account)
        .bind(&employee.ifsc_code)
        .bind(employee.employee_type)
        .bind(&employee.emergency_contact)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", &employee.id));
        }

        Ok(())
    }

    /// Counts all employees (used to number new employee codes).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Counts employees assigned to a department.
    pub async fn count_in_department(&self, department_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE department_id = ?1")
            .bind(department_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
