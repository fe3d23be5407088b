//! # Application Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HRMS_DB_PATH=/var/lib/hrms/hrms.db                                 │
//! │     HRMS_JWT_SECRET=...                                                │
//! │     HRMS_SESSION_LIFETIME_SECS=3600                                    │
//! │     HRMS_PAYMENT_METHOD="Cheque"                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/hrms/hrms.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.hrms.hrms/hrms.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/hrms/hrms.db"
//! max_connections = 5
//!
//! [auth]
//! jwt_secret = "a long random string"
//! session_lifetime_secs = 3600
//!
//! [payroll]
//! payment_method = "Bank Transfer"
//!
//! [payroll.compensation]
//! hra = { rate_bps = 2000 }
//!
//! [payroll.compensation.deductions]
//! tax = { rate_bps = 1000 }
//! ```

use std::path::PathBuf;

use hrms_core::payroll::CompensationTable;
use hrms_core::DEFAULT_PAYMENT_METHOD;
use hrms_db::DbConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Secret used when nothing is configured. Fine for development only.
pub const DEV_JWT_SECRET: &str = "hrms-development-secret-change-me";

const MIN_JWT_SECRET_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file. `None` means the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub session_lifetime_secs: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_lifetime_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollSettings {
    /// Recorded on payment when the caller gives no method.
    pub payment_method: String,
    pub compensation: CompensationTable,
}

impl Default for PayrollSettings {
    fn default() -> Self {
        PayrollSettings {
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            compensation: CompensationTable::default(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub payroll: PayrollSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (hrms.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        if config.auth.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set HRMS_JWT_SECRET in production");
        }

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "jwt_secret must be at least {} characters",
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.auth.session_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid(
                "session_lifetime_secs must be greater than 0".into(),
            ));
        }
        if self.payroll.payment_method.trim().is_empty() {
            return Err(ConfigError::Invalid("payment_method must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `HRMS_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("HRMS_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(secret) = lookup("HRMS_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(lifetime) = lookup("HRMS_SESSION_LIFETIME_SECS") {
            match lifetime.parse::<i64>() {
                Ok(secs) => self.auth.session_lifetime_secs = secs,
                Err(_) => warn!(value = %lifetime, "Ignoring non-numeric HRMS_SESSION_LIFETIME_SECS"),
            }
        }

        if let Some(method) = lookup("HRMS_PAYMENT_METHOD") {
            self.payroll.payment_method = method;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "hrms", "hrms")
            .map(|dirs| dirs.config_dir().join("hrms.toml"))
    }

    /// The database file, resolving the platform data directory when no
    /// path is configured.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        directories::ProjectDirs::from("com", "hrms", "hrms")
            .map(|dirs| dirs.data_dir().join("hrms.db"))
            .unwrap_or_else(|| PathBuf::from("hrms.db"))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path()).max_connections(self.database.max_connections)
    }
}
