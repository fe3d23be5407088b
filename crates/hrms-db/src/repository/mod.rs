//! # Repository Module
//!
//! Database repository implementations, one per table.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  hrms-app SqliteStore                                                  │
//! │       │                                                                 │
//! │       │  db.payroll().mark_paid(&record)                               │
//! │       ▼                                                                 │
//! │  PayrollRepository                                                     │
//! │  ├── insert / get_by_id / list                                         │
//! │  ├── existing_keys(period)                                             │
//! │  └── mark_paid (UPDATE ... WHERE status = 'generated')                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries are built at runtime (`sqlx::query_as` with binds and
//! `QueryBuilder` for filters) against the records in `hrms-core`.

pub mod attendance;
pub mod audit;
pub mod department;
pub mod employee;
pub mod leave;
pub mod notification;
pub mod payroll;
pub mod role;
pub mod user_role;

pub use attendance::AttendanceRepository;
pub use audit::AuditLogRepository;
pub use department::DepartmentRepository;
pub use employee::EmployeeRepository;
pub use leave::LeaveRepository;
pub use notification::NotificationRepository;
pub use payroll::PayrollRepository;
pub use role::RoleRepository;
pub use user_role::UserRoleRepository;

/// Generates a new record ID.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use chrono::{NaiveDate, TimeZone, Utc};
    use hrms_core::{Department, Employee, EmployeeStatus, EmployeeType, Money, Role};

    use crate::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn ts(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn department(id: &str, name: &str) -> Department {
        Department {
            id: id.to_string(),
            name: name.to_string(),
            manager_id: None,
            created_at: ts(0),
            updated_at: ts(0),
        }
    }

    pub fn role(id: &str, department_id: &str) -> Role {
        Role {
            id: id.to_string(),
            department_id: department_id.to_string(),
            name: format!("Role {}", id),
            description: None,
            created_at: ts(0),
        }
    }

    pub fn employee(id: &str, code: &str, first_name: &str) -> Employee {
        Employee {
            id: id.to_string(),
            employee_code: code.to_string(),
            user_id: None,
            first_name: first_name.to_string(),
            last_name: "Iyer".to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            phone: "555-0102".to_string(),
            photo_url: None,
            department_id: "dept-1".to_string(),
            role_id: "role-1".to_string(),
            date_of_birth: Some(date(1990, 7, 14)),
            address: None,
            join_date: date(2022, 1, 10),
            status: EmployeeStatus::Active,
            salary_monthly: Money::from_minor(50_000),
            bank_account: Some("000111222".to_string()),
            ifsc_code: None,
            employee_type: EmployeeType::Permanent,
            emergency_contact: None,
            created_by: Some("admin".to_string()),
            created_at: ts(0),
            updated_at: ts(0),
        }
    }

    /// Database with one department (`dept-1`), one role (`role-1`) and the
    /// given employees inserted.
    pub async fn seeded(employees: &[Employee]) -> Database {
        let db = database().await;
        db.departments().insert(&department("dept-1", "Engineering")).await.unwrap();
        db.roles().insert(&role("role-1", "dept-1")).await.unwrap();
        for e in employees {
            db.employees().insert(e).await.unwrap();
        }
        db
    }
}
