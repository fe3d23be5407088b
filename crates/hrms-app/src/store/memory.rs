//! # In-Memory Store
//!
//! Keeps every table in a map behind one `tokio::sync::Mutex`. Used by the
//! service tests and anywhere a throwaway store is handy. Uniqueness, foreign
//! key and conditional lifecycle rules mirror `001_initial_schema.sql`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{
    ActivityStore, AttendanceStore, DepartmentStore, EmployeeStore, LeaveStore, PayrollStore,
    RoleStore, StoreError, StoreResult, UserRoleStore,
};
use hrms_core::filters::{AttendanceFilter, EmployeeFilter, LeaveFilter, PayrollFilter};
use hrms_core::payroll::PayrollKey;
use hrms_core::{
    Attendance, AuditLog, Department, Employee, LeaveRequest, LeaveStatus, Notification, Payroll,
    PayrollPeriod, PayrollStatus, Role, UserRole, UserRoleAssignment,
};

#[derive(Debug, Default)]
struct Tables {
    employees: HashMap<String, Employee>,
    departments: HashMap<String, Department>,
    roles: HashMap<String, Role>,
    attendance: HashMap<(String, NaiveDate), Attendance>,
    leaves: HashMap<String, LeaveRequest>,
    payroll: HashMap<String, Payroll>,
    user_roles: Vec<UserRoleAssignment>,
    audit: Vec<AuditLog>,
    notifications: Vec<Notification>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    /// The first unique employee column `employee` collides on, ignoring its
    /// own row.
    fn employee_clash(&self, employee: &Employee) -> Option<&'static str> {
        self.employees
            .values()
            .filter(|existing| existing.id != employee.id)
            .find_map(|existing| {
                if existing.employee_code == employee.employee_code {
                    Some("employees.employee_code")
                } else if existing.email == employee.email {
                    Some("employees.email")
                } else if employee.user_id.is_some() && existing.user_id == employee.user_id {
                    Some("employees.user_id")
                } else {
                    None
                }
            })
    }
}

// =============================================================================
// Employees, Departments, Roles
// =============================================================================

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>> {
        Ok(self.tables.lock().await.employees.get(id).cloned())
    }

    async fn employee_for_user(&self, user_id: &str) -> StoreResult<Option<Employee>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .employees
            .values()
            .find(|e| e.user_id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>> {
        let tables = self.tables.lock().await;
        let mut employees: Vec<Employee> = tables
            .employees
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        employees.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        Ok(employees)
    }

    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.employees.contains_key(&employee.id) {
            return Err(StoreError::Duplicate("employees.id".into()));
        }
        if let Some(field) = tables.employee_clash(employee) {
            return Err(StoreError::Duplicate(field.into()));
        }
        if !tables.departments.contains_key(&employee.department_id)
            || !tables.roles.contains_key(&employee.role_id)
        {
            return Err(StoreError::InvalidReference(format!(
                "employee {} references unknown department or role",
                employee.id
            )));
        }
        tables.employees.insert(employee.id.clone(), employee.clone());
        Ok(())
    }

    async fn update_employee(&self, employee: &Employee) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(field) = tables.employee_clash(employee) {
            return Err(StoreError::Duplicate(field.into()));
        }
        match tables.employees.get_mut(&employee.id) {
            Some(slot) => {
                *slot = employee.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Employee", &employee.id)),
        }
    }

    async fn count_employees_in_department(&self, department_id: &str) -> StoreResult<usize> {
        let tables = self.tables.lock().await;
        Ok(tables
            .employees
            .values()
            .filter(|e| e.department_id == department_id)
            .count())
    }
}

#[async_trait]
impl DepartmentStore for MemoryStore {
    async fn get_department(&self, id: &str) -> StoreResult<Option<Department>> {
        Ok(self.tables.lock().await.departments.get(id).cloned())
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let tables = self.tables.lock().await;
        let mut departments: Vec<Department> = tables.departments.values().cloned().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn insert_department(&self, department: &Department) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.departments.values().any(|d| d.name == department.name) {
            return Err(StoreError::Duplicate("departments.name".into()));
        }
        tables
            .departments
            .insert(department.id.clone(), department.clone());
        Ok(())
    }

    async fn update_department(&self, department: &Department) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        match tables.departments.get_mut(&department.id) {
            Some(slot) => {
                *slot = department.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Department", &department.id)),
        }
    }

    async fn delete_department(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let referenced = tables.employees.values().any(|e| e.department_id == id)
            || tables.roles.values().any(|r| r.department_id == id);
        if referenced {
            return Err(StoreError::InvalidReference(format!(
                "department {} is still referenced",
                id
            )));
        }
        tables
            .departments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Department", id))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn get_role(&self, id: &str) -> StoreResult<Option<Role>> {
        Ok(self.tables.lock().await.roles.get(id).cloned())
    }

    async fn list_roles(&self, department_id: Option<&str>) -> StoreResult<Vec<Role>> {
        let tables = self.tables.lock().await;
        let mut roles: Vec<Role> = tables
            .roles
            .values()
            .filter(|r| department_id.map_or(true, |d| r.department_id == d))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn insert_role(&self, role: &Role) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.departments.contains_key(&role.department_id) {
            return Err(StoreError::InvalidReference(format!(
                "role {} references unknown department {}",
                role.id, role.department_id
            )));
        }
        let taken = tables
            .roles
            .values()
            .any(|r| r.department_id == role.department_id && r.name == role.name);
        if taken {
            return Err(StoreError::Duplicate("roles.department_id, roles.name".into()));
        }
        tables.roles.insert(role.id.clone(), role.clone());
        Ok(())
    }

    async fn delete_role(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.employees.values().any(|e| e.role_id == id) {
            return Err(StoreError::InvalidReference(format!("role {} is still assigned", id)));
        }
        tables
            .roles
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Role", id))
    }

    async fn count_roles_in_department(&self, department_id: &str) -> StoreResult<usize> {
        let tables = self.tables.lock().await;
        Ok(tables
            .roles
            .values()
            .filter(|r| r.department_id == department_id)
            .count())
    }
}

// =============================================================================
// Attendance and Leave
// =============================================================================

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn upsert_attendance(&self, record: &Attendance) -> StoreResult<Attendance> {
        let mut tables = self.tables.lock().await;
        let key = (record.employee_id.clone(), record.date);
        let stored = match tables.attendance.get_mut(&key) {
            Some(existing) => {
                existing.status = record.status;
                existing.marked_by = record.marked_by.clone();
                existing.marked_at = record.marked_at;
                if record.notes.is_some() {
                    existing.notes = record.notes.clone();
                }
                existing.clone()
            }
            None => {
                tables.attendance.insert(key, record.clone());
                record.clone()
            }
        };
        Ok(stored)
    }

    async fn get_attendance(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .attendance
            .get(&(employee_id.to_string(), date))
            .cloned())
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<Attendance> = tables
            .attendance
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.employee_id.cmp(&b.employee_id)));
        Ok(records)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn get_leave(&self, id: &str) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.tables.lock().await.leaves.get(id).cloned())
    }

    async fn list_leaves(&self, filter: &LeaveFilter) -> StoreResult<Vec<LeaveRequest>> {
        let tables = self.tables.lock().await;
        let mut requests: Vec<LeaveRequest> = tables
            .leaves
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn insert_leave(&self, request: &LeaveRequest) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.employees.contains_key(&request.employee_id) {
            return Err(StoreError::InvalidReference(format!(
                "leave request {} references unknown employee {}",
                request.id, request.employee_id
            )));
        }
        tables.leaves.insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn record_leave_decision(&self, decided: &LeaveRequest) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .leaves
            .get_mut(&decided.id)
            .ok_or_else(|| StoreError::not_found("Leave request", &decided.id))?;
        if stored.status != LeaveStatus::Pending {
            return Err(StoreError::conflict(
                "Leave request",
                &decided.id,
                LeaveStatus::Pending.as_str(),
            ));
        }
        stored.status = decided.status;
        stored.approver_id = decided.approver_id.clone();
        stored.approver_comment = decided.approver_comment.clone();
        stored.updated_at = decided.updated_at;
        Ok(())
    }
}

// =============================================================================
// Payroll
// =============================================================================

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn get_payroll(&self, id: &str) -> StoreResult<Option<Payroll>> {
        Ok(self.tables.lock().await.payroll.get(id).cloned())
    }

    async fn list_payroll(&self, filter: &PayrollFilter) -> StoreResult<Vec<Payroll>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<Payroll> = tables
            .payroll
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.period()
                .cmp(&a.period())
                .then_with(|| a.employee_id().cmp(b.employee_id()))
        });
        Ok(records)
    }

    async fn existing_payroll_keys(&self, period: PayrollPeriod) -> StoreResult<HashSet<PayrollKey>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .payroll
            .values()
            .filter(|p| p.period() == period)
            .map(Payroll::key)
            .collect())
    }

    async fn insert_generated_payroll(&self, records: Vec<Payroll>) -> StoreResult<Vec<Payroll>> {
        let mut tables = self.tables.lock().await;
        if let Some(orphan) = records
            .iter()
            .find(|r| !tables.employees.contains_key(r.employee_id()))
        {
            return Err(StoreError::InvalidReference(format!(
                "payroll {} references unknown employee {}",
                orphan.id(),
                orphan.employee_id()
            )));
        }
        let mut taken: HashSet<PayrollKey> = tables.payroll.values().map(Payroll::key).collect();
        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            if !taken.insert(record.key()) {
                continue;
            }
            tables.payroll.insert(record.id().to_string(), record.clone());
            stored.push(record);
        }
        Ok(stored)
    }

    async fn record_payment(&self, paid: &Payroll) -> StoreResult<()> {
        self.replace_generated(paid).await
    }

    async fn update_payroll_components(&self, revised: &Payroll) -> StoreResult<()> {
        self.replace_generated(revised).await
    }
}

impl MemoryStore {
    async fn replace_generated(&self, updated: &Payroll) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .payroll
            .get_mut(updated.id())
            .ok_or_else(|| StoreError::not_found("Payroll", updated.id()))?;
        if stored.status() != PayrollStatus::Generated {
            return Err(StoreError::conflict(
                "Payroll",
                updated.id(),
                PayrollStatus::Generated.as_str(),
            ));
        }
        *stored = updated.clone();
        Ok(())
    }
}

// =============================================================================
// Roles, Audit, Notifications
// =============================================================================

#[async_trait]
impl UserRoleStore for MemoryStore {
    async fn role_for_user(&self, user_id: &str) -> StoreResult<Option<UserRole>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .user_roles
            .iter()
            .filter(|a| a.user_id == user_id)
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .map(|a| a.role))
    }

    async fn assign_role(&self, assignment: &UserRoleAssignment) -> StoreResult<()> {
        self.tables.lock().await.user_roles.push(assignment.clone());
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn append_audit(&self, entry: &AuditLog) -> StoreResult<()> {
        self.tables.lock().await.audit.push(entry.clone());
        Ok(())
    }

    async fn list_audit(
        &self,
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<AuditLog>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<AuditLog> = tables
            .audit
            .iter()
            .filter(|e| resource_type.map_or(true, |t| e.resource_type == t))
            .filter(|e| resource_id.map_or(true, |id| e.resource_id.as_deref() == Some(id)))
            .cloned()
            .collect();
        // Append order breaks timestamp ties, newest first
        entries.reverse();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn push_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.tables.lock().await.notifications.push(notification.clone());
        Ok(())
    }

    async fn notifications_for(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> StoreResult<Vec<Notification>> {
        let tables = self.tables.lock().await;
        let mut found: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        found.reverse();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn mark_notification_read(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StoreError::not_found("Notification", id))?;
        notification.is_read = true;
        Ok(())
    }
}
