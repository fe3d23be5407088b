//! Fixtures shared by the service and store tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::store::{DepartmentStore, EmployeeStore, MemoryStore, RoleStore};
use hrms_core::{Department, Employee, EmployeeStatus, EmployeeType, Money, Role};

pub(crate) fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub(crate) fn employee(id: &str, code: &str, first_name: &str) -> Employee {
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
        date_of_birth: None,
        address: None,
        join_date: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
        status: EmployeeStatus::Active,
        salary_monthly: Money::from_minor(50_000),
        bank_account: None,
        ifsc_code: None,
        employee_type: EmployeeType::Permanent,
        emergency_contact: None,
        created_by: Some("admin".to_string()),
        created_at: ts(0),
        updated_at: ts(0),
    }
}

/// Store with `dept-1` (Engineering), `role-1` and the given employees.
pub(crate) async fn seeded_memory(employees: &[Employee]) -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_department(&Department {
            id: "dept-1".to_string(),
            name: "Engineering".to_string(),
            manager_id: None,
            created_at: ts(0),
            updated_at: ts(0),
        })
        .await
        .unwrap();
    store
        .insert_role(&Role {
            id: "role-1".to_string(),
            department_id: "dept-1".to_string(),
            name: "Engineer".to_string(),
            description: None,
            created_at: ts(0),
        })
        .await
        .unwrap();
    for e in employees {
        store.insert_employee(e).await.unwrap();
    }
    store
}

