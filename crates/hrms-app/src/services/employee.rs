//! # Employee Service
//!
//! Create and update both run the same checks before anything is written:
//!
//! ```text
//! NewEmployee
//!    ├── names, email, code present     (validation)
//!    ├── salary >= 0                    (validation)
//!    └── department exists, role exists,
//!        role.department_id == department_id   (check_assignment)
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{ActivityLog, Actor};
use crate::error::{AppError, AppResult};
use crate::store::Store;
use hrms_core::filters::EmployeeFilter;
use hrms_core::validation::{
    check_assignment, validate_email, validate_name, validate_non_negative, validate_required,
};
use hrms_core::{Capability, CoreError, Employee, EmployeeStatus, EmployeeType, Money};

/// Editable employee fields, as submitted by the employee form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewEmployee {
    pub employee_code: String,
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub photo_url: Option<String>,
    pub department_id: String,
    pub role_id: String,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub join_date: NaiveDate,
    pub salary_monthly: Money,
    pub bank_account: Option<String>,
    pub ifsc_code: Option<String>,
    pub employee_type: EmployeeType,
    pub emergency_contact: Option<String>,
}

impl NewEmployee {
    fn validate(&self) -> Result<(), hrms_core::ValidationError> {
        validate_required("employee_code", &self.employee_code)?;
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        validate_email(&self.email)?;
        validate_non_negative("salary_monthly", self.salary_monthly)
    }

    fn apply_to(self, employee: &mut Employee) {
        employee.employee_code = self.employee_code.trim().to_string();
        employee.user_id = self.user_id;
        employee.first_name = self.first_name.trim().to_string();
        employee.last_name = self.last_name.trim().to_string();
        employee.email = self.email.trim().to_lowercase();
        employee.phone = self.phone;
        employee.photo_url = self.photo_url;
        employee.department_id = self.department_id;
        employee.role_id = self.role_id;
        employee.date_of_birth = self.date_of_birth;
        employee.address = self.address;
        employee.join_date = self.join_date;
        employee.salary_monthly = self.salary_monthly;
        employee.bank_account = self.bank_account;
        employee.ifsc_code = self.ifsc_code;
        employee.employee_type = self.employee_type;
        employee.emergency_contact = self.emergency_contact;
    }
}

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn Store>,
    log: ActivityLog,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn Store>, log: ActivityLog) -> Self {
        EmployeeService { store, log }
    }

    pub async fn create(&self, actor: &Actor, input: NewEmployee) -> AppResult<Employee> {
        actor.require(Capability::ManageEmployees)?;
        input.validate()?;
        self.check_assignment(&input.department_id, &input.role_id).await?;

        let now = Utc::now();
        let mut employee = Employee {
            id: Uuid::new_v4().to_string(),
            employee_code: String::new(),
            user_id: None,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            photo_url: None,
            department_id: String::new(),
            role_id: String::new(),
            date_of_birth: None,
            address: None,
            join_date: input.join_date,
            status: EmployeeStatus::Active,
            salary_monthly: Money::zero(),
            bank_account: None,
            ifsc_code: None,
            employee_type: input.employee_type,
            emergency_contact: None,
            created_by: Some(actor.user_id.clone()),
            created_at: now,
            updated_at: now,
        };
        input.apply_to(&mut employee);
        self.store.insert_employee(&employee).await?;

        info!(id = %employee.id, code = %employee.employee_code, "Employee created");
        self.log
            .record(
                actor,
                "employee.create",
                "employee",
                Some(employee.id.as_str()),
                json!({ "employee_code": employee.employee_code, "department_id": employee.department_id }),
            )
            .await;
        Ok(employee)
    }

    pub async fn update(&self, actor: &Actor, employee_id: &str, input: NewEmployee) -> AppResult<Employee> {
        actor.require(Capability::ManageEmployees)?;
        input.validate()?;
        self.check_assignment(&input.department_id, &input.role_id).await?;

        let mut employee = self.load(employee_id).await?;
        input.apply_to(&mut employee);
        employee.updated_at = Utc::now();
        self.store.update_employee(&employee).await?;

        info!(id = %employee_id, "Employee updated");
        self.log
            .record(
                actor,
                "employee.update",
                "employee",
                Some(employee_id),
                json!({ "department_id": employee.department_id, "role_id": employee.role_id }),
            )
            .await;
        Ok(employee)
    }

    /// Activates or deactivates an employee. Inactive employees are skipped
    /// by payroll generation and cannot be marked for attendance.
    pub async fn set_status(&self, actor: &Actor, employee_id: &str, status: EmployeeStatus) -> AppResult<Employee> {
        actor.require(Capability::ManageEmployees)?;
        let mut employee = self.load(employee_id).await?;
        if employee.status == status {
            return Ok(employee);
        }
        employee.status = status;
        employee.updated_at = Utc::now();
        self.store.update_employee(&employee).await?;

        info!(id = %employee_id, status = status.as_str(), "Employee status changed");
        self.log
            .record(
                actor,
                "employee.set_status",
                "employee",
                Some(employee_id),
                json!({ "status": status.as_str() }),
            )
            .await;
        Ok(employee)
    }

    /// Staff can read any record; everyone else only their own.
    pub async fn get(&self, actor: &Actor, employee_id: &str) -> AppResult<Employee> {
        if !actor.is_self(employee_id) {
            actor.require(Capability::ViewEmployees)?;
        }
        self.load(employee_id).await
    }

    pub async fn list(&self, actor: &Actor, filter: &EmployeeFilter) -> AppResult<Vec<Employee>> {
        actor.require(Capability::ViewEmployees)?;
        Ok(self.store.list_employees(filter).await?)
    }

    /// The employee record linked to the signed-in user, if any.
    pub async fn profile(&self, actor: &Actor) -> AppResult<Option<Employee>> {
        actor.require(Capability::ViewProfile)?;
        Ok(self.store.employee_for_user(&actor.user_id).await?)
    }

    async fn check_assignment(&self, department_id: &str, role_id: &str) -> AppResult<()> {
        let department = self.store.get_department(department_id).await?;
        let role = self.store.get_role(role_id).await?;
        check_assignment(department_id, department.as_ref(), role_id, role.as_ref()).map_err(AppError::from)
    }

    async fn load(&self, employee_id: &str) -> AppResult<Employee> {
        self.store
            .get_employee(employee_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee", employee_id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use crate::testing::{employee, seeded_memory, ts};
    use hrms_core::{Role, UserRole};

    fn input(code: &str, email: &str) -> NewEmployee {
        NewEmployee {
            employee_code: code.to_string(),
            user_id: None,
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: email.to_string(),
            phone: "+91 98450 00000".to_string(),
            photo_url: None,
            department_id: "dept-1".to_string(),
            role_id: "role-1".to_string(),
            date_of_birth: None,
            address: None,
            join_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            salary_monthly: Money::from_minor(45_000),
            bank_account: None,
            ifsc_code: None,
            employee_type: EmployeeType::Permanent,
            emergency_contact: None,
        }
    }

    async fn setup() -> (EmployeeService, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(seeded_memory(&[employee("e1", "EMP-0001", "Meera")]).await);
        (EmployeeService::new(store.clone(), ActivityLog::new(store.clone())), store)
    }

    fn admin() -> Actor {
        Actor::new("u-admin", Some(UserRole::Admin))
    }

    #[tokio::test]
    async fn test_create_normalises_and_audits() {
        let (service, store) = setup().await;
        let created = service
            .create(&admin(), input(" EMP-0002 ", "Asha.Rao@Example.com"))
            .await
            .unwrap();
        assert_eq!(created.employee_code, "EMP-0002");
        assert_eq!(created.email, "asha.rao@example.com");
        assert_eq!(created.status, EmployeeStatus::Active);
        assert_eq!(created.created_by.as_deref(), Some("u-admin"));

        let trail = store.list_audit(Some("employee"), Some(created.id.as_str()), 10).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, "employee.create");
    }

    #[tokio::test]
    async fn test_role_must_belong_to_department() {
        let (service, store) = setup().await;
        store
            .insert_department(&hrms_core::Department {
                id: "dept-2".into(),
                name: "Finance".into(),
                manager_id: None,
                created_at: ts(0),
                updated_at: ts(0),
            })
            .await
            .unwrap();
        store
            .insert_role(&Role {
                id: "role-2".into(),
                department_id: "dept-2".into(),
                name: "Accountant".into(),
                description: None,
                created_at: ts(0),
            })
            .await
            .unwrap();

        let mut mismatched = input("EMP-0002", "asha@example.com");
        mismatched.role_id = "role-2".into();
        let err = service.create(&admin(), mismatched).await.unwrap_err();
        assert!(matches!(err, AppError::Core(CoreError::RoleDepartmentMismatch { .. })));

        let mut unknown = input("EMP-0002", "asha@example.com");
        unknown.department_id = "dept-9".into();
        let err = service.create(&admin(), unknown).await.unwrap_err();
        assert!(matches!(err, AppError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_validation_and_duplicates() {
        let (service, _) = setup().await;
        let mut negative = input("EMP-0002", "asha@example.com");
        negative.salary_monthly = Money::from_minor(-1);
        assert!(matches!(
            service.create(&admin(), negative).await,
            Err(AppError::Core(CoreError::Validation(_)))
        ));

        let taken = input("EMP-0001", "someone@example.com");
        assert!(matches!(
            service.create(&admin(), taken).await,
            Err(AppError::Store(StoreError::Duplicate(_)))
        ));
    }

    #[tokio::test]
    async fn test_access_rules() {
        let (service, _) = setup().await;
        let manager = Actor::new("u-mgr", Some(UserRole::Manager));
        assert!(service.list(&manager, &EmployeeFilter::default()).await.is_ok());
        assert!(matches!(
            service.create(&manager, input("EMP-0002", "asha@example.com")).await,
            Err(AppError::Forbidden { .. })
        ));

        let meera = Actor::new("u-meera", Some(UserRole::Employee)).with_employee("e1");
        assert!(service.get(&meera, "e1").await.is_ok());
        assert!(service.list(&meera, &EmployeeFilter::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_deactivate_and_update() {
        let (service, _) = setup().await;
        let inactive = service
            .set_status(&admin(), "e1", EmployeeStatus::Inactive)
            .await
            .unwrap();
        assert!(!inactive.is_active());

        let mut changes = input("EMP-0001", "meera.k@example.com");
        changes.first_name = "Meera".into();
        let updated = service.update(&admin(), "e1", changes).await.unwrap();
        assert_eq!(updated.email, "meera.k@example.com");
        assert_eq!(updated.status, EmployeeStatus::Inactive);
        assert_eq!(updated.salary_monthly, Money::from_minor(45_000));
    }
}
