//! # Audit Trail and Notifications
//!
//! [`ActivityLog`] is what the other services call after a state change.
//! The change has already been committed at that point, so a failed audit
//! or notification write is logged and swallowed rather than reported as a
//! failure of the call.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::Actor;
use crate::error::AppResult;
use crate::store::{Store, StoreError};
use hrms_core::{AuditLog, Capability, Notification, NotificationKind};

/// Writer used by services.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn Store>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        ActivityLog { store }
    }

    /// Appends an audit entry such as `payroll.mark_paid` on `payroll/<id>`.
    pub async fn record(
        &self,
        actor: &Actor,
        action: &str,
        resource_type: &str,
        resource_id: Option<&str>,
        details: Value,
    ) {
        let entry = AuditLog {
            id: Uuid::new_v4().to_string(),
            user_id: Some(actor.user_id.clone()),
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.map(str::to_string),
            details,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.append_audit(&entry).await {
            warn!(action, resource_type, error = %e, "Failed to write audit entry");
        }
    }

    /// Notifies the user linked to `employee_id`. Employees without a
    /// login are skipped.
    pub async fn notify_employee(
        &self,
        employee_id: &str,
        title: &str,
        message: String,
        kind: NotificationKind,
        related: (&str, &str),
    ) {
        let user_id = match self.store.get_employee(employee_id).await {
            Ok(Some(employee)) => match employee.user_id {
                Some(user_id) => user_id,
                None => {
                    debug!(employee_id, "Employee has no login, notification skipped");
                    return;
                }
            },
            Ok(None) => return,
            Err(e) => {
                warn!(employee_id, error = %e, "Could not look up employee for notification");
                return;
            }
        };

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            user_id,
            title: title.to_string(),
            message,
            kind,
            related_type: Some(related.0.to_string()),
            related_id: Some(related.1.to_string()),
            is_read: false,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.push_notification(&notification).await {
            warn!(employee_id, error = %e, "Failed to store notification");
        }
    }
}

/// Read side: audit trail for staff, notifications for the signed-in user.
#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn Store>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        ActivityService { store }
    }

    pub async fn audit_trail(
        &self,
        actor: &Actor,
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<AuditLog>> {
        actor.require(Capability::ViewReports)?;
        Ok(self.store.list_audit(resource_type, resource_id, limit).await?)
    }

    pub async fn my_notifications(&self, actor: &Actor, unread_only: bool) -> AppResult<Vec<Notification>> {
        actor.require(Capability::ViewProfile)?;
        Ok(self.store.notifications_for(&actor.user_id, unread_only).await?)
    }

    /// Marks one of the actor's own notifications read.
    pub async fn mark_read(&self, actor: &Actor, notification_id: &str) -> AppResult<()> {
        actor.require(Capability::ViewProfile)?;
        let owned = self
            .store
            .notifications_for(&actor.user_id, false)
            .await?
            .iter()
            .any(|n| n.id == notification_id);
        if !owned {
            return Err(StoreError::not_found("Notification", notification_id).into());
        }
        Ok(self.store.mark_notification_read(notification_id).await?)
    }
}
