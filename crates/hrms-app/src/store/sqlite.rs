//! # SQLite Store
//!
//! Adapts the `hrms-db` repositories to the store traits.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{
    ActivityStore, AttendanceStore, DepartmentStore, EmployeeStore, LeaveStore, PayrollStore,
    RoleStore, StoreResult, UserRoleStore,
};
use hrms_core::filters::{AttendanceFilter, EmployeeFilter, LeaveFilter, PayrollFilter};
use hrms_core::payroll::PayrollKey;
use hrms_core::{
    Attendance, AuditLog, Department, Employee, LeaveRequest, Notification, Payroll,
    PayrollPeriod, Role, UserRole, UserRoleAssignment,
};
use hrms_db::Database;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        SqliteStore { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl EmployeeStore for SqliteStore {
    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>> {
        Ok(self.db.employees().get_by_id(id).await?)
    }

    async fn employee_for_user(&self, user_id: &str) -> StoreResult<Option<Employee>> {
        Ok(self.db.employees().get_by_user_id(user_id).await?)
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>> {
        Ok(self.db.employees().list(filter).await?)
    }

    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        Ok(self.db.employees().insert(employee).await?)
    }

    async fn update_employee(&self, employee: &Employee) -> StoreResult<()> {
        Ok(self.db.employees().update(employee).await?)
    }

    async fn count_employees_in_department(&self, department_id: &str) -> StoreResult<usize> {
        let count = self.db.employees().count_in_department(department_id).await?;
        Ok(count.max(0) as usize)
    }
}

#[async_trait]
impl DepartmentStore for SqliteStore {
    async fn get_department(&self, id: &str) -> StoreResult<Option<Department>> {
        Ok(self.db.departments().get_by_id(id).await?)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        Ok(self.db.departments().list().await?)
    }

    async fn insert_department(&self, department: &Department) -> StoreResult<()> {
        Ok(self.db.departments().insert(department).await?)
    }

    async fn update_department(&self, department: &Department) -> StoreResult<()> {
        Ok(self.db.departments().update(department).await?)
    }

    async fn delete_department(&self, id: &str) -> StoreResult<()> {
        Ok(self.db.departments().delete(id).await?)
    }
}

#[async_trait]
impl RoleStore for SqliteStore {
    async fn get_role(&self, id: &str) -> StoreResult<Option<Role>> {
        Ok(self.db.roles().get_by_id(id).await?)
    }

    async fn list_roles(&self, department_id: Option<&str>) -> StoreResult<Vec<Role>> {
        Ok(self.db.roles().list(department_id).await?)
    }

    async fn insert_role(&self, role: &Role) -> StoreResult<()> {
        Ok(self.db.roles().insert(role).await?)
    }

    async fn delete_role(&self, id: &str) -> StoreResult<()> {
        Ok(self.db.roles().delete(id).await?)
    }

    async fn count_roles_in_department(&self, department_id: &str) -> StoreResult<usize> {
        let count = self.db.roles().count_in_department(department_id).await?;
        Ok(count.max(0) as usize)
    }
}

#[async_trait]
impl AttendanceStore for SqliteStore {
    async fn upsert_attendance(&self, record: &Attendance) -> StoreResult<Attendance> {
        Ok(self.db.attendance().upsert(record).await?)
    }

    async fn get_attendance(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>> {
        Ok(self.db.attendance().get(employee_id, date).await?)
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        Ok(self.db.attendance().list(filter).await?)
    }
}

#[async_trait]
impl LeaveStore for SqliteStore {
    async fn get_leave(&self, id: &str) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.db.leave_requests().get_by_id(id).await?)
    }

    async fn list_leaves(&self, filter: &LeaveFilter) -> StoreResult<Vec<LeaveRequest>> {
        Ok(self.db.leave_requests().list(filter).await?)
    }

    async fn insert_leave(&self, request: &LeaveRequest) -> StoreResult<()> {
        Ok(self.db.leave_requests().insert(request).await?)
    }

    async fn record_leave_decision(&self, decided: &LeaveRequest) -> StoreResult<()> {
        Ok(self.db.leave_requests().record_decision(decided).await?)
    }
}

#[async_trait]
impl PayrollStore for SqliteStore {
    async fn get_payroll(&self, id: &str) -> StoreResult<Option<Payroll>> {
        Ok(self.db.payroll().get_by_id(id).await?)
    }

    async fn list_payroll(&self, filter: &PayrollFilter) -> StoreResult<Vec<Payroll>> {
        Ok(self.db.payroll().list(filter).await?)
    }

    async fn existing_payroll_keys(&self, period: PayrollPeriod) -> StoreResult<HashSet<PayrollKey>> {
        Ok(self.db.payroll().existing_keys(period).await?)
    }

    async fn insert_generated_payroll(&self, records: Vec<Payroll>) -> StoreResult<Vec<Payroll>> {
        Ok(self.db.payroll().insert_generated(records).await?)
    }

    async fn record_payment(&self, paid: &Payroll) -> StoreResult<()> {
        Ok(self.db.payroll().mark_paid(paid).await?)
    }

    async fn update_payroll_components(&self, revised: &Payroll) -> StoreResult<()> {
        Ok(self.db.payroll().update_components(revised).await?)
    }
}

#[async_trait]
impl UserRoleStore for SqliteStore {
    async fn role_for_user(&self, user_id: &str) -> StoreResult<Option<UserRole>> {
        Ok(self.db.user_roles().role_for_user(user_id).await?)
    }

    async fn assign_role(&self, assignment: &UserRoleAssignment) -> StoreResult<()> {
        Ok(self.db.user_roles().assign(assignment).await?)
    }
}

#[async_trait]
impl ActivityStore for SqliteStore {
    async fn append_audit(&self, entry: &AuditLog) -> StoreResult<()> {
        Ok(self.db.audit_logs().insert(entry).await?)
    }

    async fn list_audit(
        &self,
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<AuditLog>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(self
            .db
            .audit_logs()
            .list(resource_type, resource_id, limit)
            .await?)
    }

    async fn push_notification(&self, notification: &Notification) -> StoreResult<()> {
        Ok(self.db.notifications().insert(notification).await?)
    }

    async fn notifications_for(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> StoreResult<Vec<Notification>> {
        Ok(self
            .db
            .notifications()
            .list_for_user(user_id, unread_only)
            .await?)
    }

    async fn mark_notification_read(&self, id: &str) -> StoreResult<()> {
        Ok(self.db.notifications().mark_read(id).await?)
    }
}
