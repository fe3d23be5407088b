//! # hrms-app: Application Layer for the HRMS
//!
//! Wires the pure rules of `hrms-core` to storage and identity.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          hrms-app                                       │
//! │                                                                         │
//! │  identity ──► SessionContext ──► Actor                                  │
//! │  (AuthFlow,        role +           │                                   │
//! │   provider)     permissions         ▼                                   │
//! │                          ┌──────────────────────┐                      │
//! │                          │      services        │  guard, rules,       │
//! │                          │ payroll / attendance │  audit, notify       │
//! │                          │ leave / employees .. │                      │
//! │                          └──────────┬───────────┘                      │
//! │                                     ▼                                   │
//! │                          ┌──────────────────────┐                      │
//! │                          │   store (traits)     │                      │
//! │                          │ MemoryStore          │                      │
//! │                          │ SqliteStore ─► hrms-db                      │
//! │                          └──────────────────────┘                      │
//! │                                                                         │
//! │  config (hrms.toml + HRMS_* env)   logging (tracing EnvFilter)         │
//! │  error  (AppError ──► ApiError { code, message })                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hrms_app::{logging, AppConfig, Services, SqliteStore};
//! use hrms_db::Database;
//!
//! logging::init();
//! let config = AppConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//! let services = Services::new(Arc::new(SqliteStore::new(db)), &config);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod services;
pub mod store;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, AppError, AppResult, ErrorCode};
pub use identity::{AuthError, AuthFlow, IdentityProvider, LocalIdentityProvider, SessionContext};
pub use services::{Actor, Services};
pub use store::{MemoryStore, SqliteStore, Store, StoreError};
