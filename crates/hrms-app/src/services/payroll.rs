//! # Payroll Service
//!
//! ## Lifecycle
//! ```text
//! generate(period) ──► generated ──mark_paid──► paid (terminal)
//!                          │
//!                          └──revise──► generated (totals recomputed)
//! ```
//!
//! Generation is idempotent per period: employees that already have a
//! record are skipped, both in memory and by the store's natural-key guard.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::{lost_race, ActivityLog, Actor};
use crate::error::AppResult;
use crate::store::Store;
use hrms_core::filters::{EmployeeFilter, PayrollFilter};
use hrms_core::payroll::{default_transaction_id, generate_for_period, CompensationRule, PayrollStats};
use hrms_core::{
    Capability, CoreError, NotificationKind, Payroll, PayrollComponents, PayrollPeriod,
};

#[derive(Clone)]
pub struct PayrollService {
    store: Arc<dyn Store>,
    log: ActivityLog,
    rule: Arc<dyn CompensationRule + Send + Sync>,
    default_payment_method: String,
}

impl PayrollService {
    pub fn new(
        store: Arc<dyn Store>,
        log: ActivityLog,
        rule: Arc<dyn CompensationRule + Send + Sync>,
        default_payment_method: impl Into<String>,
    ) -> Self {
        PayrollService {
            store,
            log,
            rule,
            default_payment_method: default_payment_method.into(),
        }
    }

    /// Creates records for every active employee that has none for `period`.
    /// Returns only the records created by this call.
    pub async fn generate(&self, actor: &Actor, period: PayrollPeriod) -> AppResult<Vec<Payroll>> {
        actor.require(Capability::ManagePayroll)?;

        let employees = self.store.list_employees(&EmployeeFilter::active()).await?;
        let existing = self.store.existing_payroll_keys(period).await?;
        let drafts = generate_for_period(
            &employees,
            &existing,
            period,
            self.rule.as_ref(),
            &actor.user_id,
            Utc::now(),
        )?;
        let created = self.store.insert_generated_payroll(drafts).await?;

        info!(
            period = %period,
            created = created.len(),
            skipped = employees.len() - created.len(),
            "Payroll generated"
        );
        self.log
            .record(
                actor,
                "payroll.generate",
                "payroll",
                None,
                json!({ "period": period.to_string(), "created": created.len() }),
            )
            .await;
        Ok(created)
    }

    /// Creates one record with explicit components.
    ///
    /// ## Returns
    /// * `Err(CoreError::DuplicatePayroll)` - the employee already has a record for `period`
    pub async fn create(
        &self,
        actor: &Actor,
        employee_id: &str,
        period: PayrollPeriod,
        components: PayrollComponents,
    ) -> AppResult<Payroll> {
        actor.require(Capability::ManagePayroll)?;

        if self.store.get_employee(employee_id).await?.is_none() {
            return Err(CoreError::not_found("Employee", employee_id).into());
        }
        let draft = Payroll::generate(employee_id, period, components, &actor.user_id, Utc::now())?;
        let duplicate = || CoreError::DuplicatePayroll {
            employee_id: employee_id.to_string(),
            year: period.year,
            month: period.month,
        };

        let created = self
            .store
            .insert_generated_payroll(vec![draft])
            .await?
            .pop()
            .ok_or_else(duplicate)?;

        info!(id = %created.id(), employee_id, period = %period, net = %created.net_pay(), "Payroll created");
        self.log
            .record(
                actor,
                "payroll.create",
                "payroll",
                Some(created.id()),
                json!({ "employee_id": employee_id, "period": period.to_string() }),
            )
            .await;
        Ok(created)
    }

    /// Marks a generated record paid. Method defaults to the configured
    /// payment method, transaction id to `TXN<millis>`.
    pub async fn mark_paid(
        &self,
        actor: &Actor,
        payroll_id: &str,
        payment_method: Option<&str>,
        transaction_id: Option<&str>,
    ) -> AppResult<Payroll> {
        actor.require(Capability::ManagePayroll)?;

        let mut payroll = self.load(payroll_id).await?;
        let now = Utc::now();
        let method = non_blank(payment_method).unwrap_or(self.default_payment_method.as_str());
        let txn = non_blank(transaction_id)
            .map(str::to_string)
            .unwrap_or_else(|| default_transaction_id(now));

        payroll.mark_paid(method, txn, now)?;
        if let Err(e) = self.store.record_payment(&payroll).await {
            let current = self.store.get_payroll(payroll_id).await?;
            return Err(lost_race(
                e,
                "Payroll",
                payroll_id,
                current.as_ref().map(|p| p.status().as_str()),
                "mark paid",
            ));
        }

        info!(
            id = %payroll_id,
            method,
            txn = ?payroll.transaction_id(),
            net = %payroll.net_pay(),
            "Payroll marked paid"
        );
        self.log
            .record(
                actor,
                "payroll.mark_paid",
                "payroll",
                Some(payroll_id),
                json!({
                    "payment_method": payroll.payment_method(),
                    "transaction_id": payroll.transaction_id(),
                    "net_pay": payroll.net_pay().minor(),
                }),
            )
            .await;
        self.log
            .notify_employee(
                payroll.employee_id(),
                "Salary paid",
                format!("Your salary for {} ({}) has been paid", payroll.period(), payroll.net_pay()),
                NotificationKind::Success,
                ("payroll", payroll_id),
            )
            .await;
        Ok(payroll)
    }

    /// Replaces the components of an unpaid record.
    pub async fn revise(
        &self,
        actor: &Actor,
        payroll_id: &str,
        components: PayrollComponents,
    ) -> AppResult<Payroll> {
        actor.require(Capability::ManagePayroll)?;

        let mut payroll = self.load(payroll_id).await?;
        payroll.revise(components, Utc::now())?;
        if let Err(e) = self.store.update_payroll_components(&payroll).await {
            let current = self.store.get_payroll(payroll_id).await?;
            return Err(lost_race(
                e,
                "Payroll",
                payroll_id,
                current.as_ref().map(|p| p.status().as_str()),
                "revise",
            ));
        }

        self.log
            .record(
                actor,
                "payroll.revise",
                "payroll",
                Some(payroll_id),
                json!({ "net_pay": payroll.net_pay().minor() }),
            )
            .await;
        Ok(payroll)
    }

    pub async fn get(&self, actor: &Actor, payroll_id: &str) -> AppResult<Payroll> {
        actor.require(Capability::ViewPayroll)?;
        self.load(payroll_id).await
    }

    pub async fn list(&self, actor: &Actor, filter: &PayrollFilter) -> AppResult<Vec<Payroll>> {
        actor.require(Capability::ViewPayroll)?;
        Ok(self.store.list_payroll(filter).await?)
    }

    pub async fn stats(&self, actor: &Actor, filter: &PayrollFilter) -> AppResult<PayrollStats> {
        let records = self.list(actor, filter).await?;
        Ok(PayrollStats::from_records(&records))
    }

    async fn load(&self, payroll_id: &str) -> AppResult<Payroll> {
        self.store
            .get_payroll(payroll_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payroll", payroll_id).into())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
