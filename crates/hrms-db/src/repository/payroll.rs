//! # Payroll Repository
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  payroll row                                                            │
//! │                                                                         │
//! │  basic, hra, overtime            INTEGER minor units                    │
//! │  allowances, deductions          TEXT JSON  {"travel": 2000}            │
//! │  gross_pay, total_deductions,    INTEGER, written from the components   │
//! │  net_pay                         for reporting queries                  │
//! │                                                                         │
//! │  Reading back: Payroll::restore recomputes the totals from the          │
//! │  components; a stored total that disagrees is logged and ignored.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Generation uses `ON CONFLICT (employee_id, year, month) DO NOTHING`, so a
//! concurrent run for the same period never creates a second record.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use hrms_core::filters::PayrollFilter;
use hrms_core::payroll::{ComponentMap, PayrollKey, StoredPayroll};
use hrms_core::{Money, Payroll, PayrollComponents, PayrollPeriod, PayrollStatus};

const PAYROLL_COLUMNS: &str = r#"
    id, employee_id, year, month, basic, hra, overtime, allowances, deductions,
    gross_pay, total_deductions, net_pay, status, paid_at, payment_method,
    transaction_id, created_by, created_at, updated_at
"#;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PayrollRow {
    id: String,
    employee_id: String,
    year: i64,
    month: i64,
    basic: Money,
    hra: Money,
    overtime: Money,
    allowances: String,
    deductions: String,
    gross_pay: Money,
    total_deductions: Money,
    net_pay: Money,
    status: PayrollStatus,
    paid_at: Option<DateTime<Utc>>,
    payment_method: Option<String>,
    transaction_id: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PayrollRow {
    fn into_payroll(self) -> DbResult<Payroll> {
        let allowances: ComponentMap =
            serde_json::from_str(&self.allowances).map_err(|e| DbError::decode("allowances", e))?;
        let deductions: ComponentMap =
            serde_json::from_str(&self.deductions).map_err(|e| DbError::decode("deductions", e))?;

        let month = u32::try_from(self.month).map_err(|e| DbError::decode("month", e))?;
        let year = i32::try_from(self.year).map_err(|e| DbError::decode("year", e))?;
        let period = PayrollPeriod::new(year, month).map_err(|e| DbError::decode("month", e))?;

        let payroll = Payroll::restore(StoredPayroll {
            id: self.id,
            employee_id: self.employee_id,
            period,
            components: PayrollComponents {
                basic: self.basic,
                hra: self.hra,
                overtime: self.overtime,
                allowances,
                deductions,
            },
            status: self.status,
            paid_at: self.paid_at,
            payment_method: self.payment_method,
            transaction_id: self.transaction_id,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|e| DbError::decode("payroll", e))?;

        if payroll.gross_pay() != self.gross_pay
            || payroll.total_deductions() != self.total_deductions
            || payroll.net_pay() != self.net_pay
        {
            warn!(
                id = %payroll.id(),
                stored_net = self.net_pay.minor(),
                computed_net = payroll.net_pay().minor(),
                "Stored payroll totals disagree with components; using computed values"
            );
        }

        Ok(payroll)
    }
}

fn encode_components(map: &ComponentMap, column: &str) -> DbResult<String> {
    serde_json::to_string(map).map_err(|e| DbError::decode(column, e))
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct PayrollRepository {
    pool: SqlitePool,
}

impl PayrollRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PayrollRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payroll>> {
        let sql = format!("SELECT {} FROM payroll WHERE id = ?1", PAYROLL_COLUMNS);
        let row = sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PayrollRow::into_payroll).transpose()
    }

    /// Lists records matching `filter`, latest period first.
    pub async fn list(&self, filter: &PayrollFilter) -> DbResult<Vec<Payroll>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM payroll WHERE 1 = 1", PAYROLL_COLUMNS));
        if let Some(employee_id) = &filter.employee_id {
            query.push(" AND employee_id = ").push_bind(employee_id.clone());
        }
        if let Some(period) = filter.period {
            query
                .push(" AND year = ")
                .push_bind(period.year)
                .push(" AND month = ")
                .push_bind(period.month as i64);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY year DESC, month DESC, employee_id");

        let rows = query
            .build_query_as::<PayrollRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PayrollRow::into_payroll).collect()
    }

    /// Natural keys already stored for `period`.
    pub async fn existing_keys(&self, period: PayrollPeriod) -> DbResult<HashSet<PayrollKey>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT employee_id FROM payroll WHERE year = ?1 AND month = ?2")
                .bind(period.year)
                .bind(period.month as i64)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids
            .into_iter()
            .map(|employee_id| PayrollKey::new(employee_id, period))
            .collect())
    }

    /// Inserts one record.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the (employee, year, month) key exists
    pub async fn insert(&self, payroll: &Payroll) -> DbResult<()> {
        debug!(employee_id = %payroll.employee_id(), period = %payroll.period(), "Inserting payroll");

        let sql = insert_sql(false);
        let allowances = encode_components(payroll.allowances(), "allowances")?;
        let deductions = encode_components(payroll.deductions(), "deductions")?;
        bind_payroll(sqlx::query(&sql), payroll, allowances, deductions)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Inserts freshly generated records in one transaction, skipping any
    /// whose natural key already exists. Returns the records that were
    /// actually stored.
    pub async fn insert_generated(&self, records: Vec<Payroll>) -> DbResult<Vec<Payroll>> {
        let sql = insert_sql(true);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut stored = Vec::with_capacity(records.len());
        for payroll in records {
            let allowances = encode_components(payroll.allowances(), "allowances")?;
            let deductions = encode_components(payroll.deductions(), "deductions")?;
            let result = bind_payroll(sqlx::query(&sql), &payroll, allowances, deductions)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 1 {
                stored.push(payroll);
            } else {
                debug!(employee_id = %payroll.employee_id(), "Payroll already exists for period, skipped");
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(count = stored.len(), "Generated payroll records stored");
        Ok(stored)
    }

    /// Persists a `mark_paid` transition.
    ///
    /// The update only applies while the stored row is still `generated`.
    pub async fn mark_paid(&self, payroll: &Payroll) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payroll SET
                status = ?2,
                paid_at = ?3,
                payment_method = ?4,
                transaction_id = ?5,
                updated_at = ?6
            WHERE id = ?1 AND status = ?7
            "#,
        )
        .bind(payroll.id())
        .bind(payroll.status())
        .bind(payroll.paid_at())
        .bind(payroll.payment_method())
        .bind(payroll.transaction_id())
        .bind(payroll.updated_at())
        .bind(PayrollStatus::Generated)
        .execute(&self.pool)
        .await?;

        self.require_transition(payroll.id(), result.rows_affected()).await?;
        info!(id = %payroll.id(), txn = ?payroll.transaction_id(), "Payroll marked paid");
        Ok(())
    }

    /// Persists revised components of an unpaid record.
    pub async fn update_components(&self, payroll: &Payroll) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payroll SET
                basic = ?2,
                hra = ?3,
                overtime = ?4,
                allowances = ?5,
                deductions = ?6,
                gross_pay = ?7,
                total_deductions = ?8,
                net_pay = ?9,
                updated_at = ?10
            WHERE id = ?1 AND status = ?11
            "#,
        )
        .bind(payroll.id())
        .bind(payroll.basic())
        .bind(payroll.hra())
        .bind(payroll.overtime())
        .bind(encode_components(payroll.allowances(), "allowances")?)
        .bind(encode_components(payroll.deductions(), "deductions")?)
        .bind(payroll.gross_pay())
        .bind(payroll.total_deductions())
        .bind(payroll.net_pay())
        .bind(payroll.updated_at())
        .bind(PayrollStatus::Generated)
        .execute(&self.pool)
        .await?;

        self.require_transition(payroll.id(), result.rows_affected()).await
    }

    async fn require_transition(&self, id: &str, rows_affected: u64) -> DbResult<()> {
        if rows_affected > 0 {
            return Ok(());
        }
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM payroll WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Err(DbError::state_conflict(
                "Payroll",
                id,
                PayrollStatus::Generated.as_str(),
            )),
            None => Err(DbError::not_found("Payroll", id)),
        }
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

fn bind_payroll<'q>(
    query: SqliteQuery<'q>,
    payroll: &'q Payroll,
    allowances: String,
    deductions: String,
) -> SqliteQuery<'q> {
    query
        .bind(payroll.id())
        .bind(payroll.employee_id())
        .bind(payroll.period().year)
        .bind(payroll.period().month as i64)
        .bind(payroll.basic())
        .bind(payroll.hra())
        .bind(payroll.overtime())
        .bind(allowances)
        .bind(deductions)
        .bind(payroll.gross_pay())
        .bind(payroll.total_deductions())
        .bind(payroll.net_pay())
        .bind(payroll.status())
        .bind(payroll.paid_at())
        .bind(payroll.payment_method())
        .bind(payroll.transaction_id())
        .bind(payroll.created_by())
        .bind(payroll.created_at())
        .bind(payroll.updated_at())
}

fn insert_sql(skip_existing: bool) -> String {
    format!(
        r#"
        INSERT INTO payroll ({})
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
        {}
        "#,
        PAYROLL_COLUMNS,
        if skip_existing {
            "ON CONFLICT (employee_id, year, month) DO NOTHING"
        } else {
            ""
        }
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
