//! # Department and Role Service
//!
//! A department's manager must be an active employee. A department can only
//! be deleted once no employee and no role points at it; the counts are
//! reported back in `CoreError::DepartmentInUse`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::{ActivityLog, Actor};
use crate::error::AppResult;
use crate::store::Store;
use hrms_core::validation::{check_manager, validate_name};
use hrms_core::{Capability, CoreError, Department, Role};

#[derive(Clone)]
pub struct DepartmentService {
    store: Arc<dyn Store>,
    log: ActivityLog,
}

impl DepartmentService {
    pub fn new(store: Arc<dyn Store>, log: ActivityLog) -> Self {
        DepartmentService { store, log }
    }

    pub async fn create(&self, actor: &Actor, name: &str, manager_id: Option<&str>) -> AppResult<Department> {
        actor.require(Capability::ManageDepartments)?;
        validate_name("name", name)?;
        self.check_manager(manager_id).await?;

        let now = Utc::now();
        let department = Department {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            manager_id: manager_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_department(&department).await?;

        info!(id = %department.id, name = %department.name, "Department created");
        self.log
            .record(
                actor,
                "department.create",
                "department",
                Some(department.id.as_str()),
                json!({ "name": department.name, "manager_id": department.manager_id }),
            )
            .await;
        Ok(department)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        department_id: &str,
        name: &str,
        manager_id: Option<&str>,
    ) -> AppResult<Department> {
        actor.require(Capability::ManageDepartments)?;
        validate_name("name", name)?;
        self.check_manager(manager_id).await?;

        let mut department = self.load(department_id).await?;
        department.name = name.trim().to_string();
        department.manager_id = manager_id.map(str::to_string);
        department.updated_at = Utc::now();
        self.store.update_department(&department).await?;

        self.log
            .record(
                actor,
                "department.update",
                "department",
                Some(department_id),
                json!({ "name": department.name, "manager_id": department.manager_id }),
            )
            .await;
        Ok(department)
    }

    pub async fn delete(&self, actor: &Actor, department_id: &str) -> AppResult<()> {
        actor.require(Capability::ManageDepartments)?;
        self.load(department_id).await?;

        let employees = self.store.count_employees_in_department(department_id).await?;
        let roles = self.store.count_roles_in_department(department_id).await?;
        if employees > 0 || roles > 0 {
            return Err(CoreError::DepartmentInUse {
                department_id: department_id.to_string(),
                employees,
                roles,
            }
            .into());
        }
        self.store.delete_department(department_id).await?;

        info!(id = %department_id, "Department deleted");
        self.log
            .record(actor, "department.delete", "department", Some(department_id), json!({}))
            .await;
        Ok(())
    }

    pub async fn list(&self, actor: &Actor) -> AppResult<Vec<Department>> {
        actor.require(Capability::ViewDepartments)?;
        Ok(self.store.list_departments().await?)
    }

    // =========================================================================
    // Roles
    // =========================================================================

    pub async fn create_role(
        &self,
        actor: &Actor,
        department_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<Role> {
        actor.require(Capability::ManageDepartments)?;
        validate_name("name", name)?;
        self.load(department_id).await?;

        let role = Role {
            id: Uuid::new_v4().to_string(),
            department_id: department_id.to_string(),
            name: name.trim().to_string(),
            description: description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string),
            created_at: Utc::now(),
        };
        self.store.insert_role(&role).await?;

        self.log
            .record(
                actor,
                "role.create",
                "role",
                Some(role.id.as_str()),
                json!({ "department_id": department_id, "name": role.name }),
            )
            .await;
        Ok(role)
    }

    /// Roles of one department, or all roles when `department_id` is `None`.
    pub async fn list_roles(&self, actor: &Actor, department_id: Option<&str>) -> AppResult<Vec<Role>> {
        actor.require(Capability::ViewDepartments)?;
        Ok(self.store.list_roles(department_id).await?)
    }

    pub async fn delete_role(&self, actor: &Actor, role_id: &str) -> AppResult<()> {
        actor.require(Capability::ManageDepartments)?;
        self.store.delete_role(role_id).await?;
        self.log
            .record(actor, "role.delete", "role", Some(role_id), json!({}))
            .await;
        Ok(())
    }

    async fn check_manager(&self, manager_id: Option<&str>) -> AppResult<()> {
        let Some(manager_id) = manager_id else {
            return Ok(());
        };
        let manager = self.store.get_employee(manager_id).await?;
        Ok(check_manager(manager_id, manager.as_ref())?)
    }

    async fn load(&self, department_id: &str) -> AppResult<Department> {
        self.store
            .get_department(department_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Department", department_id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::testing::{employee, seeded_memory};
    use hrms_core::{EmployeeStatus, UserRole};

    async fn setup() -> DepartmentService {
        let mut gone = employee("e2", "EMP-0002", "Arjun");
        gone.status = EmployeeStatus::Inactive;
        let store: Arc<dyn Store> =
            Arc::new(seeded_memory(&[employee("e1", "EMP-0001", "Meera"), gone]).await);
        DepartmentService::new(store.clone(), ActivityLog::new(store))
    }

    fn hr() -> Actor {
        Actor::new("u-hr", Some(UserRole::Hr))
    }

    #[tokio::test]
    async fn test_manager_must_be_active() {
        let service = setup().await;
        let ops = service.create(&hr(), "Operations", Some("e1")).await.unwrap();
        assert_eq!(ops.manager_id.as_deref(), Some("e1"));

        let err = service.update(&hr(), &ops.id, "Operations", Some("e2")).await.unwrap_err();
        assert!(matches!(err, AppError::Core(CoreError::InactiveManager(_))));

        let err = service.create(&hr(), "Legal", Some("e9")).await.unwrap_err();
        assert!(matches!(err, AppError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_blocked_while_referenced() {
        let service = setup().await;
        let err = service.delete(&hr(), "dept-1").await.unwrap_err();
        match err {
            AppError::Core(CoreError::DepartmentInUse { employees, roles, .. }) => {
                assert_eq!(employees, 2);
                assert_eq!(roles, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        let empty = service.create(&hr(), "Facilities", None).await.unwrap();
        let role = service
            .create_role(&hr(), &empty.id, "Coordinator", Some("  "))
            .await
            .unwrap();
        assert!(role.description.is_none());
        assert!(service.delete(&hr(), &empty.id).await.is_err());

        service.delete_role(&hr(), &role.id).await.unwrap();
        service.delete(&hr(), &empty.id).await.unwrap();
        assert_eq!(service.list(&hr()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_manager_can_view_but_not_manage() {
        let service = setup().await;
        let manager = Actor::new("u-mgr", Some(UserRole::Manager));
        assert_eq!(service.list_roles(&manager, Some("dept-1")).await.unwrap().len(), 1);
        assert!(matches!(
            service.create(&manager, "Sales", None).await,
            Err(AppError::Forbidden { .. })
        ));
    }
}
