//! # hrms-core: Pure Business Logic for the HRMS
//!
//! This crate holds every HR business rule as pure functions and plain
//! records with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          HRMS Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │   Employees ─ Attendance ─ Leave Requests ─ Payroll ─ Reports  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    hrms-app (services)                          │   │
//! │  │   PayrollService, AttendanceService, LeaveService, identity    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hrms-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  payroll  │  │   leave   │  │permissions│  │   │
//! │  │   │ Employee  │  │  Totals   │  │  approve  │  │  resolve  │  │   │
//! │  │   │ Payroll   │  │  markPaid │  │  reject   │  │  allows   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    hrms-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Employee, Department, Payroll, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Form and referential validation
//! - [`payroll`] - Payroll engine: totals, lifecycle, period generation
//! - [`attendance`] - Attendance marking rules
//! - [`leave`] - Leave request state machine
//! - [`permissions`] - Role to permission resolution
//! - [`filters`] - List filters used by the pages
//! - [`stats`] - Aggregate counters for dashboards
//!
//! ## Example Usage
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use hrms_core::money::Money;
//! use hrms_core::payroll::compute_totals;
//!
//! let mut allowances = BTreeMap::new();
//! allowances.insert("travel".to_string(), Money::from_minor(2_000));
//! let mut deductions = BTreeMap::new();
//! deductions.insert("tax".to_string(), Money::from_minor(5_000));
//!
//! let totals = compute_totals(
//!     Money::from_minor(50_000),
//!     Money::from_minor(10_000),
//!     Money::zero(),
//!     &allowances,
//!     &deductions,
//! )
//! .unwrap();
//!
//! assert_eq!(totals.gross_pay.minor(), 62_000);
//! assert_eq!(totals.net_pay.minor(), 57_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod attendance;
pub mod error;
pub mod filters;
pub mod leave;
pub mod money;
pub mod payroll;
pub mod permissions;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use payroll::{Payroll, PayrollComponents, PayrollPeriod, PayrollTotals};
pub use permissions::{resolve_permissions, Capability, Permissions};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Comment stamped on an approved leave request when the approver leaves none.
pub const DEFAULT_APPROVE_COMMENT: &str = "Approved";

/// Comment stamped on a rejected leave request when the approver leaves none.
pub const DEFAULT_REJECT_COMMENT: &str = "Rejected";

/// Payment method recorded when a payroll is paid without an explicit method.
pub const DEFAULT_PAYMENT_METHOD: &str = "Bank Transfer";
