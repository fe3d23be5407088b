//! # Payroll Engine
//!
//! Totals arithmetic, the payroll lifecycle and per-period generation.
//!
//! ## Payroll Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Payroll Lifecycle                               │
//! │                                                                         │
//! │  Employees (active)          CompensationRule                          │
//! │        │                           │                                    │
//! │        ▼                           ▼                                    │
//! │  generate_for_period ──► Payroll { status: generated }                 │
//! │   (skips existing                  │                                    │
//! │    (employee, year, month))        │ mark_paid(method, txn, at)         │
//! │                                    ▼                                    │
//! │                          Payroll { status: paid } ── terminal          │
//! │                                                                         │
//! │  At every step:                                                        │
//! │    gross_pay        = basic + hra + overtime + Σ allowances            │
//! │    total_deductions = Σ deductions                                     │
//! │    net_pay          = gross_pay − total_deductions                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The derived totals live in private fields and are only ever written by
//! [`compute_totals`], so a `Payroll` value cannot disagree with its
//! components.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Rate};
use crate::types::{Employee, PayrollStatus};
use crate::validation::validate_non_negative;

/// Labelled amounts such as `{"travel": 2000}`.
pub type ComponentMap = BTreeMap<String, Money>;

// =============================================================================
// Totals
// =============================================================================

/// Derived payroll amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PayrollTotals {
    pub gross_pay: Money,
    pub total_deductions: Money,
    pub net_pay: Money,
}

/// Computes gross, total deductions and net pay with exact integer sums.
///
/// Negative components are rejected; a negative `net_pay` (deductions larger
/// than gross) is allowed and reported as-is. Sums that do not fit in an
/// `i64` fail with `ValidationError::OutOfRange`.
///
/// ```rust
/// use std::collections::BTreeMap;
/// use hrms_core::money::Money;
/// use hrms_core::payroll::compute_totals;
///
/// let totals = compute_totals(
///     Money::from_minor(50_000),
///     Money::from_minor(10_000),
///     Money::zero(),
///     &BTreeMap::new(),
///     &BTreeMap::new(),
/// )
/// .unwrap();
/// assert_eq!(totals.net_pay.minor(), 60_000);
/// ```
pub fn compute_totals(
    basic: Money,
    hra: Money,
    overtime: Money,
    allowances: &ComponentMap,
    deductions: &ComponentMap,
) -> CoreResult<PayrollTotals> {
    validate_non_negative("basic", basic)?;
    validate_non_negative("hra", hra)?;
    validate_non_negative("overtime", overtime)?;
    for (label, amount) in allowances {
        validate_non_negative(&format!("allowance '{}'", label), *amount)?;
    }
    for (label, amount) in deductions {
        validate_non_negative(&format!("deduction '{}'", label), *amount)?;
    }

    let gross_pay = [hra, overtime]
        .into_iter()
        .chain(allowances.values().copied())
        .try_fold(basic, Money::checked_add)
        .ok_or_else(|| overflow("gross_pay"))?;
    let total_deductions = deductions
        .values()
        .copied()
        .try_fold(Money::zero(), Money::checked_add)
        .ok_or_else(|| overflow("total_deductions"))?;
    let net_pay = gross_pay
        .checked_sub(total_deductions)
        .ok_or_else(|| overflow("net_pay"))?;

    Ok(PayrollTotals {
        gross_pay,
        total_deductions,
        net_pay,
    })
}

fn overflow(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

// =============================================================================
// Period
// =============================================================================

/// A calendar month payroll is run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PayrollPeriod {
    pub year: i32,
    pub month: u32,
}

impl PayrollPeriod {
    /// Validates `month` in 1..=12 and a plausible year.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            });
        }
        if !(1900..=9999).contains(&year) {
            return Err(ValidationError::OutOfRange {
                field: "year".to_string(),
                min: 1900,
                max: 9999,
            });
        }
        Ok(PayrollPeriod { year, month })
    }
}

impl fmt::Display for PayrollPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Natural key of a payroll record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayrollKey {
    pub employee_id: String,
    pub period: PayrollPeriod,
}

impl PayrollKey {
    pub fn new(employee_id: impl Into<String>, period: PayrollPeriod) -> Self {
        PayrollKey {
            employee_id: employee_id.into(),
            period,
        }
    }
}

// =============================================================================
// Components
// =============================================================================

/// The independently settable amounts of a payroll record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PayrollComponents {
    pub basic: Money,
    pub hra: Money,
    pub overtime: Money,
    pub allowances: ComponentMap,
    pub deductions: ComponentMap,
}

impl PayrollComponents {
    pub fn totals(&self) -> CoreResult<PayrollTotals> {
        compute_totals(
            self.basic,
            self.hra,
            self.overtime,
            &self.allowances,
            &self.deductions,
        )
    }
}

// =============================================================================
// Payroll Record
// =============================================================================

/// A payroll record for one employee and one month.
///
/// Built through [`Payroll::generate`] or [`Payroll::restore`]; both compute
/// the totals from the components.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Payroll {
    id: String,
    employee_id: String,
    year: i32,
    month: u32,
    basic: Money,
    hra: Money,
    overtime: Money,
    allowances: ComponentMap,
    deductions: ComponentMap,
    gross_pay: Money,
    total_deductions: Money,
    net_pay: Money,
    status: PayrollStatus,
    #[ts(as = "Option<String>")]
    paid_at: Option<DateTime<Utc>>,
    payment_method: Option<String>,
    transaction_id: Option<String>,
    created_by: String,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
    #[ts(as = "String")]
    updated_at: DateTime<Utc>,
}

/// Persisted form of a payroll record, as read back from storage.
///
/// Stored totals are not part of this struct; they are recomputed.
#[derive(Debug, Clone)]
pub struct StoredPayroll {
    pub id: String,
    pub employee_id: String,
    pub period: PayrollPeriod,
    pub components: PayrollComponents,
    pub status: PayrollStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payroll {
    /// Creates a new record in `generated` status.
    pub fn generate(
        employee_id: impl Into<String>,
        period: PayrollPeriod,
        components: PayrollComponents,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        Self::restore(StoredPayroll {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.into(),
            period,
            components,
            status: PayrollStatus::Generated,
            paid_at: None,
            payment_method: None,
            transaction_id: None,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a record from storage, recomputing the derived totals.
    pub fn restore(stored: StoredPayroll) -> CoreResult<Self> {
        let totals = stored.components.totals()?;
        let PayrollComponents {
            basic,
            hra,
            overtime,
            allowances,
            deductions,
        } = stored.components;

        Ok(Payroll {
            id: stored.id,
            employee_id: stored.employee_id,
            year: stored.period.year,
            month: stored.period.month,
            basic,
            hra,
            overtime,
            allowances,
            deductions,
            gross_pay: totals.gross_pay,
            total_deductions: totals.total_deductions,
            net_pay: totals.net_pay,
            status: stored.status,
            paid_at: stored.paid_at,
            payment_method: stored.payment_method,
            transaction_id: stored.transaction_id,
            created_by: stored.created_by,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    /// Records disbursement. Only a `generated` record can be paid; totals
    /// are left untouched.
    ///
    /// ```text
    /// generated ──mark_paid──► paid
    /// paid      ──mark_paid──► InvalidStateTransition
    /// ```
    pub fn mark_paid(
        &mut self,
        payment_method: impl Into<String>,
        transaction_id: impl Into<String>,
        paid_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.require_generated("mark paid")?;
        self.status = PayrollStatus::Paid;
        self.payment_method = Some(payment_method.into());
        self.transaction_id = Some(transaction_id.into());
        self.paid_at = Some(paid_at);
        self.updated_at = paid_at;
        Ok(())
    }

    /// Replaces the components of an unpaid record and recomputes totals.
    pub fn revise(&mut self, components: PayrollComponents, now: DateTime<Utc>) -> CoreResult<()> {
        self.require_generated("revise")?;
        let totals = components.totals()?;
        self.basic = components.basic;
        self.hra = components.hra;
        self.overtime = components.overtime;
        self.allowances = components.allowances;
        self.deductions = components.deductions;
        self.gross_pay = totals.gross_pay;
        self.total_deductions = totals.total_deductions;
        self.net_pay = totals.net_pay;
        self.updated_at = now;
        Ok(())
    }

    fn require_generated(&self, action: &str) -> CoreResult<()> {
        if self.status != PayrollStatus::Generated {
            return Err(CoreError::invalid_transition(
                "Payroll",
                &self.id,
                self.status.as_str(),
                action,
            ));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    pub fn period(&self) -> PayrollPeriod {
        PayrollPeriod {
            year: self.year,
            month: self.month,
        }
    }

    pub fn key(&self) -> PayrollKey {
        PayrollKey::new(self.employee_id.clone(), self.period())
    }

    pub fn basic(&self) -> Money {
        self.basic
    }

    pub fn hra(&self) -> Money {
        self.hra
    }

    pub fn overtime(&self) -> Money {
        self.overtime
    }

    pub fn allowances(&self) -> &ComponentMap {
        &self.allowances
    }

    pub fn deductions(&self) -> &ComponentMap {
        &self.deductions
    }

    pub fn components(&self) -> PayrollComponents {
        PayrollComponents {
            basic: self.basic,
            hra: self.hra,
            overtime: self.overtime,
            allowances: self.allowances.clone(),
            deductions: self.deductions.clone(),
        }
    }

    pub fn totals(&self) -> PayrollTotals {
        PayrollTotals {
            gross_pay: self.gross_pay,
            total_deductions: self.total_deductions,
            net_pay: self.net_pay,
        }
    }

    pub fn gross_pay(&self) -> Money {
        self.gross_pay
    }

    pub fn total_deductions(&self) -> Money {
        self.total_deductions
    }

    pub fn net_pay(&self) -> Money {
        self.net_pay
    }

    pub fn status(&self) -> PayrollStatus {
        self.status
    }

    pub fn is_paid(&self) -> bool {
        self.status == PayrollStatus::Paid
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Transaction id used when the payer does not supply one: `TXN<millis>`.
pub fn default_transaction_id(now: DateTime<Utc>) -> String {
    format!("TXN{}", now.timestamp_millis())
}

// =============================================================================
// Compensation Rules
// =============================================================================

/// Non-basic components produced for one employee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compensation {
    pub hra: Money,
    pub overtime: Money,
    pub allowances: ComponentMap,
    pub deductions: ComponentMap,
}

/// Supplies HRA, overtime, allowances and deductions during generation.
///
/// `basic` is always the employee's monthly salary.
pub trait CompensationRule {
    fn compensation(&self, employee: &Employee, basic: Money, period: PayrollPeriod) -> Compensation;
}

impl<F> CompensationRule for F
where
    F: Fn(&Employee, Money, PayrollPeriod) -> Compensation,
{
    fn compensation(&self, employee: &Employee, basic: Money, period: PayrollPeriod) -> Compensation {
        self(employee, basic, period)
    }
}

/// A configured amount: fixed, or a share of basic.
///
/// In TOML: `{ fixed = 2000 }` or `{ rate_bps = 2000 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentAmount {
    Fixed(Money),
    RateBps(Rate),
}

impl ComponentAmount {
    pub fn resolve(&self, basic: Money) -> Money {
        match self {
            ComponentAmount::Fixed(amount) => *amount,
            ComponentAmount::RateBps(rate) => basic.apply_rate(*rate),
        }
    }
}

impl Default for ComponentAmount {
    fn default() -> Self {
        ComponentAmount::Fixed(Money::zero())
    }
}

/// Table-driven compensation policy, loaded from the `[payroll.compensation]`
/// config section.
///
/// ```toml
/// [payroll.compensation]
/// hra = { rate_bps = 2000 }
///
/// [payroll.compensation.allowances]
/// travel = { fixed = 2000 }
///
/// [payroll.compensation.deductions]
/// tax = { rate_bps = 1000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationTable {
    pub hra: ComponentAmount,
    pub overtime: ComponentAmount,
    pub allowances: BTreeMap<String, ComponentAmount>,
    pub deductions: BTreeMap<String, ComponentAmount>,
}

impl Default for CompensationTable {
    /// HRA at 20% of basic, nothing else.
    fn default() -> Self {
        CompensationTable {
            hra: ComponentAmount::RateBps(Rate::from_bps(2_000)),
            overtime: ComponentAmount::default(),
            allowances: BTreeMap::new(),
            deductions: BTreeMap::new(),
        }
    }
}

impl CompensationRule for CompensationTable {
    fn compensation(&self, _employee: &Employee, basic: Money, _period: PayrollPeriod) -> Compensation {
        let resolve_all = |table: &BTreeMap<String, ComponentAmount>| {
            table
                .iter()
                .map(|(label, amount)| (label.clone(), amount.resolve(basic)))
                .collect::<ComponentMap>()
        };

        Compensation {
            hra: self.hra.resolve(basic),
            overtime: self.overtime.resolve(basic),
            allowances: resolve_all(&self.allowances),
            deductions: resolve_all(&self.deductions),
        }
    }
}

// =============================================================================
// Generation
// =============================================================================

/// Creates one `generated` record per active employee that has no record
/// for `period`.
///
/// `existing` holds the natural keys already stored. An employee listed
/// twice in `employees` still gets a single record.
pub fn generate_for_period(
    employees: &[Employee],
    existing: &HashSet<PayrollKey>,
    period: PayrollPeriod,
    rule: &dyn CompensationRule,
    created_by: &str,
    now: DateTime<Utc>,
) -> CoreResult<Vec<Payroll>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut generated = Vec::new();

    for employee in employees {
        if !employee.is_active() {
            continue;
        }
        if !seen.insert(employee.id.as_str()) {
            continue;
        }
        if existing.contains(&PayrollKey::new(employee.id.clone(), period)) {
            continue;
        }

        let basic = employee.salary_monthly;
        let extra = rule.compensation(employee, basic, period);
        let components = PayrollComponents {
            basic,
            hra: extra.hra,
            overtime: extra.overtime,
            allowances: extra.allowances,
            deductions: extra.deductions,
        };
        generated.push(Payroll::generate(
            employee.id.clone(),
            period,
            components,
            created_by,
            now,
        )?);
    }

    Ok(generated)
}

// =============================================================================
// Statistics
// =============================================================================

/// Net-pay aggregates shown above the payroll list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct PayrollStats {
    pub total_net: Money,
    pub paid_net: Money,
    pub pending_net: Money,
    pub count: usize,
    pub paid_count: usize,
    pub pending_count: usize,
}

impl PayrollStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Payroll>) -> Self {
        let mut stats = PayrollStats::default();
        for record in records {
            stats.count += 1;
            stats.total_net += record.net_pay();
            match record.status() {
                PayrollStatus::Paid => {
                    stats.paid_count += 1;
                    stats.paid_net += record.net_pay();
                }
                PayrollStatus::Generated => {
                    stats.pending_count += 1;
                    stats.pending_net += record.net_pay();
                }
                PayrollStatus::Rejected => {}
            }
        }
        stats
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
