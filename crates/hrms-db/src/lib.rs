//! # hrms-db: Database Layer for the HRMS
//!
//! SQLite storage for employees, attendance, leave, payroll and the
//! supporting tables, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          HRMS Data Flow                                 │
//! │                                                                         │
//! │  hrms-app service (PayrollService::mark_paid)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     hrms-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │ │   │
//! │  │   │               │    │ EmployeeRepo   │    │              │ │   │
//! │  │   │ SqlitePool    │◄───│ AttendanceRepo │    │ 001_initial  │ │   │
//! │  │   │ Connection    │    │ LeaveRepo      │    │   _schema    │ │   │
//! │  │   │ Management    │    │ PayrollRepo .. │    │              │ │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘ │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/hrms/hrms.db                                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hrms_db::{Database, DbConfig};
//! use hrms_core::filters::EmployeeFilter;
//!
//! let db = Database::new(DbConfig::new("path/to/hrms.db")).await?;
//! let active = db.employees().list(&EmployeeFilter::active()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    generate_id, AttendanceRepository, AuditLogRepository, DepartmentRepository,
    EmployeeRepository, LeaveRepository, NotificationRepository, PayrollRepository,
    RoleRepository, UserRoleRepository,
};
