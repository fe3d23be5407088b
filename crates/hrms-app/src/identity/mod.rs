//! # Identity Collaborator
//!
//! Authentication is delegated to an [`IdentityProvider`]. This module owns
//! the contract, the translation of provider errors into the messages users
//! see, and the sign-in flow with its optional MFA step.
//!
//! ## Sign-in Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AuthFlow::sign_in(email, password)                                    │
//! │       │                                                                 │
//! │       ├── provider.sign_in ──✗──► translate_provider_error             │
//! │       │        "Invalid login credentials" → "Invalid email or password"│
//! │       ▼                                                                 │
//! │  provider.mfa_list_factors                                             │
//! │       │                                                                 │
//! │       ├── verified TOTP factor ──► SignInOutcome::MfaRequired          │
//! │       │                             └── AuthFlow::verify_mfa(code)     │
//! │       └── none ─────────────────► SignInOutcome::SignedIn(context)     │
//! │                                                                         │
//! │  SessionContext = session + role (user_roles, default employee)        │
//! │                           + permissions (resolve_permissions)          │
//! │                           + employee_id (employees.user_id)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod jwt;
pub mod local;

pub use jwt::{Claims, JwtManager};
pub use local::LocalIdentityProvider;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::services::Actor;
use crate::store::Store;
use hrms_core::validation::{validate_email, validate_password, SignUpForm};
use hrms_core::{resolve_permissions, Permissions, UserRole, ValidationError};

// =============================================================================
// Errors
// =============================================================================

/// Error as reported by the provider, before translation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Message(String),

    #[error("Multi-factor authentication is not available")]
    MfaUnavailable,
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Authentication failures, worded for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This email is already registered")]
    AlreadyRegistered,

    /// Sign-up form failed the client-side checks.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Multi-factor authentication is not available")]
    MfaUnavailable,

    #[error("No MFA factor found")]
    NoMfaFactor,

    #[error("Not signed in or the session has expired")]
    InvalidSession,

    /// Any other provider message, passed through verbatim.
    #[error("{0}")]
    Provider(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Maps provider messages onto the wording shown to users.
pub fn translate_provider_error(err: ProviderError) -> AuthError {
    match err {
        ProviderError::Message(message) if message.contains("Invalid login credentials") => {
            AuthError::InvalidCredentials
        }
        ProviderError::Message(message) if message.contains("already registered") => {
            AuthError::AlreadyRegistered
        }
        ProviderError::Message(message) if message.contains("session missing") => {
            AuthError::InvalidSession
        }
        ProviderError::Message(message) => AuthError::Provider(message),
        ProviderError::MfaUnavailable => AuthError::MfaUnavailable,
    }
}

// =============================================================================
// Provider Contract
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Extra profile fields captured at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub access_token: String,
    pub user: IdentityUser,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FactorStatus {
    Verified,
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MfaFactor {
    pub id: String,
    /// `"totp"` for authenticator apps.
    pub factor_type: String,
    pub friendly_name: Option<String>,
    pub status: FactorStatus,
}

impl MfaFactor {
    pub fn is_verified_totp(&self) -> bool {
        self.factor_type == "totp" && self.status == FactorStatus::Verified
    }
}

/// Returned by enrollment; `qr_code` is shown to the user once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MfaEnrollment {
    pub factor_id: String,
    pub qr_code: String,
    pub secret: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MfaChallenge {
    pub id: String,
    pub factor_id: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

/// External identity service: password login, session tracking, MFA.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, profile: &UserProfile) -> ProviderResult<IdentityUser>;

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<Session>;

    async fn sign_out(&self) -> ProviderResult<()>;

    async fn get_session(&self) -> ProviderResult<Option<Session>>;

    /// Starts the password-reset flow for `email`. Unknown addresses succeed
    /// without effect so callers cannot tell which emails are registered.
    async fn reset_password(&self, email: &str) -> ProviderResult<()>;

    /// Replaces the password of the signed-in user.
    async fn update_password(&self, new_password: &str) -> ProviderResult<()>;

    /// Receives the current session on every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;

    /// The user's role. Falls back to [`UserRole::Employee`] when no role
    /// row exists or the lookup fails.
    async fn get_user_role(&self, user_id: &str) -> UserRole;

    async fn mfa_enroll(&self) -> ProviderResult<MfaEnrollment>;

    async fn mfa_list_factors(&self) -> ProviderResult<Vec<MfaFactor>>;

    async fn mfa_challenge(&self, factor_id: &str) -> ProviderResult<MfaChallenge>;

    async fn mfa_verify(&self, factor_id: &str, challenge_id: &str, code: &str) -> ProviderResult<()>;
}

// =============================================================================
// Session Context
// =============================================================================

/// A signed-in user with their resolved role, permissions and linked
/// employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SessionContext {
    pub session: Session,
    pub role: UserRole,
    pub permissions: Permissions,
    /// Employee whose `user_id` is this user, if one exists.
    pub employee_id: Option<String>,
}

impl SessionContext {
    pub fn new(session: Session, role: UserRole) -> Self {
        SessionContext {
            session,
            role,
            permissions: resolve_permissions(Some(role)),
            employee_id: None,
        }
    }

    pub fn with_employee(mut self, employee_id: Option<String>) -> Self {
        self.employee_id = employee_id;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.session.user.id
    }

    /// The acting user for service calls, carrying the linked employee so
    /// own-record checks work.
    pub fn actor(&self) -> Actor {
        let actor = Actor::new(self.user_id(), Some(self.role));
        match &self.employee_id {
            Some(employee_id) => actor.with_employee(employee_id.clone()),
            None => actor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(SessionContext),
    /// Password accepted; the user must pass a TOTP check before the
    /// session is usable.
    MfaRequired { factor_id: String },
}

// =============================================================================
// Auth Flow
// =============================================================================

/// Sign-in front end over a provider. The store links signed-in users to
/// their employee records.
#[derive(Clone)]
pub struct AuthFlow {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn Store>,
}

impl AuthFlow {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn Store>) -> Self {
        AuthFlow { provider, store }
    }

    /// Runs the form checks, then registers the user with the provider.
    pub async fn sign_up(&self, form: &SignUpForm, phone: Option<String>) -> AuthResult<IdentityUser> {
        form.validate()?;
        let profile = UserProfile {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            phone,
        };
        let user = self
            .provider
            .sign_up(form.email.trim(), &form.password, &profile)
            .await
            .map_err(translate_provider_error)?;
        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SignInOutcome> {
        let session = self
            .provider
            .sign_in(email.trim(), password)
            .await
            .map_err(translate_provider_error)?;

        if let Some(factor) = self.verified_factor().await? {
            debug!(user_id = %session.user.id, "MFA step required");
            return Ok(SignInOutcome::MfaRequired { factor_id: factor.id });
        }

        info!(user_id = %session.user.id, "User signed in");
        Ok(SignInOutcome::SignedIn(self.context(session).await))
    }

    /// Completes sign-in with a TOTP code against the first verified factor.
    pub async fn verify_mfa(&self, code: &str) -> AuthResult<SessionContext> {
        let factor = self.verified_factor().await?.ok_or(AuthError::NoMfaFactor)?;
        let challenge = self
            .provider
            .mfa_challenge(&factor.id)
            .await
            .map_err(translate_provider_error)?;
        self.provider
            .mfa_verify(&factor.id, &challenge.id, code.trim())
            .await
            .map_err(translate_provider_error)?;

        self.current().await?.ok_or(AuthError::InvalidSession)
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        self.provider.sign_out().await.map_err(translate_provider_error)
    }

    /// Requests a reset link for `email` once the address is well formed.
    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        let email = email.trim();
        validate_email(email)?;
        self.provider
            .reset_password(email)
            .await
            .map_err(translate_provider_error)?;
        info!("Password reset requested");
        Ok(())
    }

    /// Sets a new password for the signed-in user after the length check.
    pub async fn update_password(&self, new_password: &str) -> AuthResult<()> {
        validate_password(new_password)?;
        self.provider
            .update_password(new_password)
            .await
            .map_err(translate_provider_error)?;
        info!("Password updated");
        Ok(())
    }

    /// The current session with role and permissions, if signed in.
    pub async fn current(&self) -> AuthResult<Option<SessionContext>> {
        let session = self
            .provider
            .get_session()
            .await
            .map_err(translate_provider_error)?;
        match session {
            Some(session) => Ok(Some(self.context(session).await)),
            None => Ok(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.provider.subscribe()
    }

    async fn context(&self, session: Session) -> SessionContext {
        let role = self.provider.get_user_role(&session.user.id).await;
        let employee_id = match self.store.employee_for_user(&session.user.id).await {
            Ok(employee) => employee.map(|e| e.id),
            Err(e) => {
                warn!(user_id = %session.user.id, error = %e, "Employee lookup failed");
                None
            }
        };
        SessionContext::new(session, role).with_employee(employee_id)
    }

    async fn verified_factor(&self) -> AuthResult<Option<MfaFactor>> {
        match self.provider.mfa_list_factors().await {
            Ok(factors) => Ok(factors.into_iter().find(MfaFactor::is_verified_totp)),
            Err(ProviderError::MfaUnavailable) => Ok(None),
            Err(e) => Err(translate_provider_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    const GOOD_CODE: &str = "123456";

    fn session_for(user_id: &str) -> Session {
        Session {
            access_token: "token".into(),
            user: IdentityUser {
                id: user_id.into(),
                email: "asha@example.com".into(),
                first_name: "Asha".into(),
                last_name: "Rao".into(),
                phone: None,
            },
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }

    /// Provider with one verified TOTP factor. The password step parks the
    /// session; only a good code makes it current.
    struct TotpProvider {
        pending: Mutex<Option<Session>>,
        session: watch::Sender<Option<Session>>,
    }

    impl TotpProvider {
        fn new() -> Self {
            let (session, _) = watch::channel(None);
            TotpProvider {
                pending: Mutex::new(None),
                session,
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for TotpProvider {
        async fn sign_up(&self, _: &str, _: &str, _: &UserProfile) -> ProviderResult<IdentityUser> {
            Err(ProviderError::Message("Signups not allowed".into()))
        }

        async fn sign_in(&self, _email: &str, _password: &str) -> ProviderResult<Session> {
            let session = session_for("u-1");
            *self.pending.lock().unwrap() = Some(session.clone());
            Ok(session)
        }

        async fn sign_out(&self) -> ProviderResult<()> {
            self.session.send_replace(None);
            Ok(())
        }

        async fn get_session(&self) -> ProviderResult<Option<Session>> {
            Ok(self.session.borrow().clone())
        }

        async fn reset_password(&self, _email: &str) -> ProviderResult<()> {
            Ok(())
        }

        async fn update_password(&self, _new_password: &str) -> ProviderResult<()> {
            Ok(())
        }

        fn subscribe(&self) -> watch::Receiver<Option<Session>> {
            self.session.subscribe()
        }

        async fn get_user_role(&self, _user_id: &str) -> UserRole {
            UserRole::Hr
        }

        async fn mfa_enroll(&self) -> ProviderResult<MfaEnrollment> {
            Err(ProviderError::Message("Factor already enrolled".into()))
        }

        async fn mfa_list_factors(&self) -> ProviderResult<Vec<MfaFactor>> {
            Ok(vec![MfaFactor {
                id: "factor-1".into(),
                factor_type: "totp".into(),
                friendly_name: Some("Phone".into()),
                status: FactorStatus::Verified,
            }])
        }

        async fn mfa_challenge(&self, factor_id: &str) -> ProviderResult<MfaChallenge> {
            Ok(MfaChallenge {
                id: "challenge-1".into(),
                factor_id: factor_id.into(),
                expires_at: Utc::now() + chrono::Duration::minutes(5),
            })
        }

        async fn mfa_verify(&self, factor_id: &str, challenge_id: &str, code: &str) -> ProviderResult<()> {
            assert_eq!((factor_id, challenge_id), ("factor-1", "challenge-1"));
            if code != GOOD_CODE {
                return Err(ProviderError::Message("Invalid TOTP code entered".into()));
            }
            let session = self.pending.lock().unwrap().take();
            self.session.send_replace(session);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sign_in_with_totp_factor() {
        let flow = AuthFlow::new(Arc::new(TotpProvider::new()), Arc::new(MemoryStore::new()));

        let outcome = flow.sign_in("asha@example.com", "secret1").await.unwrap();
        assert_eq!(
            outcome,
            SignInOutcome::MfaRequired {
                factor_id: "factor-1".into()
            }
        );
        assert!(flow.current().await.unwrap().is_none());

        let err = flow.verify_mfa("000000").await.unwrap_err();
        assert_eq!(err, AuthError::Provider("Invalid TOTP code entered".into()));
        assert_eq!(err.to_string(), "Invalid TOTP code entered");

        let context = flow.verify_mfa(" 123456 ").await.unwrap();
        assert_eq!(context.user_id(), "u-1");
        assert_eq!(context.role, UserRole::Hr);
        assert!(context.permissions.can_manage_payroll);
        assert_eq!(context.employee_id, None);
    }

    #[test]
    fn test_translation() {
        assert_eq!(
            translate_provider_error(ProviderError::Message("Invalid login credentials".into())),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            translate_provider_error(ProviderError::Message("User already registered".into())).to_string(),
            "This email is already registered"
        );
        assert_eq!(
            translate_provider_error(ProviderError::Message("Email not confirmed".into())).to_string(),
            "Email not confirmed"
        );
        assert_eq!(
            translate_provider_error(ProviderError::Message("Auth session missing!".into())),
            AuthError::InvalidSession
        );
    }

    #[test]
    fn test_context_resolves_permissions() {
        let session = Session {
            access_token: "token".into(),
            user: IdentityUser {
                id: "u-1".into(),
                email: "asha@example.com".into(),
                first_name: "Asha".into(),
                last_name: "Rao".into(),
                phone: None,
            },
            expires_at: Utc::now(),
        };
        let context = SessionContext::new(session, UserRole::Manager);
        assert!(context.permissions.can_view_payroll);
        assert!(!context.permissions.can_manage_payroll);

        let actor = context.actor();
        assert_eq!(actor.user_id, "u-1");
        assert_eq!(actor.role, Some(UserRole::Manager));
        assert_eq!(actor.employee_id, None);

        let linked = context.with_employee(Some("e1".into())).actor();
        assert!(linked.is_self("e1"));
    }

    #[test]
    fn test_factor_selection() {
        let pending = MfaFactor {
            id: "f-1".into(),
            factor_type: "totp".into(),
            friendly_name: None,
            status: FactorStatus::Unverified,
        };
        let verified = MfaFactor {
            status: FactorStatus::Verified,
            id: "f-2".into(),
            ..pending.clone()
        };
        assert!(!pending.is_verified_totp());
        assert!(verified.is_verified_totp());
    }
}
