//! # Leave Service
//!
//! Submission is open to every role, but a plain employee can only apply
//! for themselves. Decisions are one-shot: the store only accepts the
//! write while the request is still pending, so two approvers racing on
//! the same request cannot both win.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::{lost_race, ActivityLog, Actor};
use crate::error::{AppError, AppResult};
use crate::store::Store;
use hrms_core::filters::LeaveFilter;
use hrms_core::leave::{self, LeaveApplication, LeaveStats};
use hrms_core::{Capability, CoreError, LeaveRequest, LeaveStatus, NotificationKind};

#[derive(Clone)]
pub struct LeaveService {
    store: Arc<dyn Store>,
    log: ActivityLog,
}

impl LeaveService {
    pub fn new(store: Arc<dyn Store>, log: ActivityLog) -> Self {
        LeaveService { store, log }
    }

    pub async fn submit(&self, actor: &Actor, application: LeaveApplication) -> AppResult<LeaveRequest> {
        actor.require(Capability::ViewLeaveRequests)?;
        if !actor.is_self(&application.employee_id) {
            actor.require(Capability::ManageLeaveRequests)?;
        }

        let employee = self
            .store
            .get_employee(&application.employee_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee", &application.employee_id))?;

        let request = leave::submit(application, Utc::now())?;
        self.store.insert_leave(&request).await?;

        info!(
            id = %request.id,
            employee_id = %employee.id,
            days = request.total_days,
            "Leave request submitted"
        );
        self.log
            .record(
                actor,
                "leave.submit",
                "leave_request",
                Some(request.id.as_str()),
                json!({
                    "employee_id": request.employee_id,
                    "from_date": request.from_date,
                    "to_date": request.to_date,
                    "total_days": request.total_days,
                }),
            )
            .await;
        Ok(request)
    }

    pub async fn approve(&self, actor: &Actor, request_id: &str, comment: Option<&str>) -> AppResult<LeaveRequest> {
        self.decide(actor, request_id, LeaveStatus::Approved, comment).await
    }

    pub async fn reject(&self, actor: &Actor, request_id: &str, comment: Option<&str>) -> AppResult<LeaveRequest> {
        self.decide(actor, request_id, LeaveStatus::Rejected, comment).await
    }

    async fn decide(
        &self,
        actor: &Actor,
        request_id: &str,
        outcome: LeaveStatus,
        comment: Option<&str>,
    ) -> AppResult<LeaveRequest> {
        actor.require(Capability::ManageLeaveRequests)?;

        let mut request = self.load(request_id).await?;
        let now = Utc::now();
        let action = match outcome {
            LeaveStatus::Approved => {
                leave::approve(&mut request, &actor.user_id, comment, now)?;
                "approve"
            }
            _ => {
                leave::reject(&mut request, &actor.user_id, comment, now)?;
                "reject"
            }
        };

        if let Err(e) = self.store.record_leave_decision(&request).await {
            let current = self.store.get_leave(request_id).await?;
            return Err(lost_race(
                e,
                "Leave request",
                request_id,
                current.as_ref().map(|r| r.status.as_str()),
                action,
            ));
        }

        info!(id = %request_id, status = request.status.as_str(), approver = %actor.user_id, "Leave request decided");
        self.log
            .record(
                actor,
                &format!("leave.{}", action),
                "leave_request",
                Some(request_id),
                json!({
                    "status": request.status.as_str(),
                    "comment": request.approver_comment,
                }),
            )
            .await;

        let (title, kind) = match request.status {
            LeaveStatus::Approved => ("Leave approved", NotificationKind::Success),
            _ => ("Leave rejected", NotificationKind::Warning),
        };
        self.log
            .notify_employee(
                &request.employee_id,
                title,
                format!(
                    "Your leave from {} to {} was {}",
                    request.from_date,
                    request.to_date,
                    request.status.as_str()
                ),
                kind,
                ("leave_request", request_id),
            )
            .await;
        Ok(request)
    }

    /// Lists requests. Actors who cannot manage leave only see their own.
    pub async fn list(&self, actor: &Actor, filter: &LeaveFilter) -> AppResult<Vec<LeaveRequest>> {
        actor.require(Capability::ViewLeaveRequests)?;
        if actor.can(Capability::ManageLeaveRequests) {
            return Ok(self.store.list_leaves(filter).await?);
        }

        let Some(own_id) = actor.employee_id.clone() else {
            return Ok(Vec::new());
        };
        let scoped = LeaveFilter {
            employee_id: Some(own_id),
            ..filter.clone()
        };
        Ok(self.store.list_leaves(&scoped).await?)
    }

    pub async fn get(&self, actor: &Actor, request_id: &str) -> AppResult<LeaveRequest> {
        actor.require(Capability::ViewLeaveRequests)?;
        let request = self.load(request_id).await?;
        if !actor.can(Capability::ManageLeaveRequests) && !actor.is_self(&request.employee_id) {
            return Err(AppError::forbidden(Capability::ManageLeaveRequests));
        }
        Ok(request)
    }

    pub async fn stats(&self, actor: &Actor) -> AppResult<LeaveStats> {
        let requests = self.list(actor, &LeaveFilter::default()).await?;
        Ok(LeaveStats::from_requests(&requests))
    }

    async fn load(&self, request_id: &str) -> AppResult<LeaveRequest> {
        self.store
            .get_leave(request_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Leave request", request_id).into())
    }
}
