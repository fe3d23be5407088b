//! # Local Identity Provider
//!
//! In-process [`IdentityProvider`] for development and tests. Accounts live
//! in memory with argon2 password hashes; sessions are JWTs signed with the
//! configured secret. Roles are read from the `user_roles` store.
//!
//! Password resets are logged rather than mailed.
//!
//! MFA is not offered: every MFA call reports
//! [`ProviderError::MfaUnavailable`], which `AuthFlow` treats as "no factor
//! enrolled".

use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    IdentityProvider, IdentityUser, JwtManager, MfaChallenge, MfaEnrollment, MfaFactor,
    ProviderError, ProviderResult, Session, UserProfile,
};
use crate::config::AuthSettings;
use crate::store::Store;
use hrms_core::UserRole;

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const ALREADY_REGISTERED: &str = "User already registered";
const SESSION_MISSING: &str = "Auth session missing!";

struct Account {
    user: IdentityUser,
    password_hash: String,
}

pub struct LocalIdentityProvider {
    /// Keyed by lowercased email.
    accounts: Mutex<HashMap<String, Account>>,
    jwt: JwtManager,
    store: Arc<dyn Store>,
    session: watch::Sender<Option<Session>>,
}

impl LocalIdentityProvider {
    pub fn new(store: Arc<dyn Store>, jwt: JwtManager) -> Self {
        let (session, _) = watch::channel(None);
        LocalIdentityProvider {
            accounts: Mutex::new(HashMap::new()),
            jwt,
            store,
            session,
        }
    }

    pub fn from_settings(store: Arc<dyn Store>, settings: &AuthSettings) -> Self {
        Self::new(
            store,
            JwtManager::new(settings.jwt_secret.clone(), settings.session_lifetime_secs),
        )
    }
}

fn hash_password(password: &str) -> ProviderResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ProviderError::Message(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str, profile: &UserProfile) -> ProviderResult<IdentityUser> {
        let key = email.trim().to_lowercase();
        if self.accounts.lock().await.contains_key(&key) {
            return Err(ProviderError::Message(ALREADY_REGISTERED.to_string()));
        }

        // Hash without holding the lock, then re-check for a concurrent sign-up
        let password_hash = hash_password(password)?;
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&key) {
            return Err(ProviderError::Message(ALREADY_REGISTERED.to_string()));
        }

        let user = IdentityUser {
            id: Uuid::new_v4().to_string(),
            email: key.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone(),
        };
        accounts.insert(
            key,
            Account {
                user: user.clone(),
                password_hash,
            },
        );
        info!(user_id = %user.id, "Local account created");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<Session> {
        let key = email.trim().to_lowercase();
        let user = {
            let accounts = self.accounts.lock().await;
            match accounts.get(&key) {
                Some(account) if verify_password(password, &account.password_hash) => account.user.clone(),
                _ => return Err(ProviderError::Message(INVALID_CREDENTIALS.to_string())),
            }
        };

        let (access_token, claims) = self
            .jwt
            .issue(&user.id, &user.email)
            .map_err(|e| ProviderError::Message(e.to_string()))?;
        let session = Session {
            access_token,
            expires_at: claims.expires_at(),
            user,
        };
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        self.session.send_replace(None);
        Ok(())
    }

    /// The stored session, provided its token still validates. An expired
    /// session is cleared and listeners are told.
    async fn get_session(&self) -> ProviderResult<Option<Session>> {
        let current = self.session.borrow().clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if self.jwt.validate(&session.access_token).is_err() {
            self.session.send_replace(None);
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn reset_password(&self, email: &str) -> ProviderResult<()> {
        let key = email.trim().to_lowercase();
        match self.accounts.lock().await.get(&key) {
            Some(account) => info!(user_id = %account.user.id, "Password reset requested"),
            None => debug!("Password reset requested for unknown email"),
        }
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> ProviderResult<()> {
        let current = self.session.borrow().clone();
        let Some(session) = current else {
            return Err(ProviderError::Message(SESSION_MISSING.to_string()));
        };

        let password_hash = hash_password(new_password)?;
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&session.user.email)
            .ok_or_else(|| ProviderError::Message(SESSION_MISSING.to_string()))?;
        account.password_hash = password_hash;
        info!(user_id = %session.user.id, "Password updated");
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    async fn get_user_role(&self, user_id: &str) -> UserRole {
        match self.store.role_for_user(user_id).await {
            Ok(Some(role)) => role,
            Ok(None) => UserRole::Employee,
            Err(e) => {
                warn!(user_id, error = %e, "Role lookup failed, using employee");
                UserRole::Employee
            }
        }
    }

    async fn mfa_enroll(&self) -> ProviderResult<MfaEnrollment> {
        Err(ProviderError::MfaUnavailable)
    }

    async fn mfa_list_factors(&self) -> ProviderResult<Vec<MfaFactor>> {
        Err(ProviderError::MfaUnavailable)
    }

    async fn mfa_challenge(&self, _factor_id: &str) -> ProviderResult<MfaChallenge> {
        Err(ProviderError::MfaUnavailable)
    }

    async fn mfa_verify(&self, _factor_id: &str, _challenge_id: &str, _code: &str) -> ProviderResult<()> {
        Err(ProviderError::MfaUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AuthError, AuthFlow, SignInOutcome};
    use crate::services::{ActivityLog, LeaveService};
    use crate::store::MemoryStore;
    use crate::testing::{employee, seeded_memory};
    use chrono::{NaiveDate, Utc};
    use hrms_core::filters::LeaveFilter;
    use hrms_core::leave::LeaveApplication;
    use hrms_core::validation::SignUpForm;
    use hrms_core::{LeaveType, UserRoleAssignment, ValidationError};

    fn form(email: &str) -> SignUpForm {
        SignUpForm {
            email: email.to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
        }
    }

    fn setup() -> (AuthFlow, Arc<LocalIdentityProvider>, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let provider = Arc::new(LocalIdentityProvider::new(
            store.clone(),
            JwtManager::new("test-secret-0123456789", 3600),
        ));
        (AuthFlow::new(provider.clone(), store.clone()), provider, store)
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let (flow, provider, store) = setup();
        let user = flow.sign_up(&form("Asha@Example.com"), None).await.unwrap();
        assert_eq!(user.email, "asha@example.com");

        let mut listener = provider.subscribe();
        let outcome = flow.sign_in("asha@example.com", "secret1").await.unwrap();
        let SignInOutcome::SignedIn(context) = outcome else {
            panic!("MFA should not be required");
        };
        assert_eq!(context.role, UserRole::Employee);
        assert!(!context.permissions.can_view_payroll);
        assert!(listener.has_changed().unwrap());
        assert!(listener.borrow_and_update().is_some());

        store
            .assign_role(&UserRoleAssignment {
                id: "ur-1".into(),
                user_id: user.id.clone(),
                role: UserRole::Hr,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let current = flow.current().await.unwrap().unwrap();
        assert_eq!(current.role, UserRole::Hr);
        assert!(current.permissions.can_manage_payroll);

        flow.sign_out().await.unwrap();
        assert!(flow.current().await.unwrap().is_none());
        assert!(listener.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_errors_are_translated() {
        let (flow, _, _) = setup();
        flow.sign_up(&form("asha@example.com"), None).await.unwrap();

        assert_eq!(
            flow.sign_up(&form("asha@example.com"), None).await.unwrap_err(),
            AuthError::AlreadyRegistered
        );
        let err = flow.sign_in("asha@example.com", "wrong-password").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(
            flow.sign_in("nobody@example.com", "secret1").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_form_checks_run_first() {
        let (flow, _, _) = setup();
        let mut short = form("asha@example.com");
        short.password = "abc".into();
        short.confirm_password = "abc".into();
        assert_eq!(
            flow.sign_up(&short, None).await.unwrap_err(),
            AuthError::Validation(ValidationError::PasswordTooShort { min: 6 })
        );

        let mut mismatch = form("asha@example.com");
        mismatch.confirm_password = "secret2".into();
        assert_eq!(
            flow.sign_up(&mismatch, None).await.unwrap_err().to_string(),
            "Passwords do not match"
        );

        // Nothing was registered, so the address is still free.
        assert!(flow.sign_up(&form("asha@example.com"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_password_reset_and_update() {
        let (flow, _, _) = setup();
        flow.sign_up(&form("asha@example.com"), None).await.unwrap();

        flow.reset_password("asha@example.com").await.unwrap();
        flow.reset_password("nobody@example.com").await.unwrap();
        assert!(matches!(
            flow.reset_password("not-an-email").await,
            Err(AuthError::Validation(_))
        ));

        assert_eq!(flow.update_password("newpass1").await.unwrap_err(), AuthError::InvalidSession);

        flow.sign_in("asha@example.com", "secret1").await.unwrap();
        assert_eq!(
            flow.update_password("abc").await.unwrap_err(),
            AuthError::Validation(ValidationError::PasswordTooShort { min: 6 })
        );
        flow.update_password("newpass1").await.unwrap();
        flow.sign_out().await.unwrap();

        assert_eq!(
            flow.sign_in("asha@example.com", "secret1").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert!(flow.sign_in("asha@example.com", "newpass1").await.is_ok());
    }

    #[tokio::test]
    async fn test_signed_in_employee_manages_own_leave() {
        let store: Arc<dyn Store> = Arc::new(seeded_memory(&[]).await);
        let provider = Arc::new(LocalIdentityProvider::new(
            store.clone(),
            JwtManager::new("test-secret-0123456789", 3600),
        ));
        let flow = AuthFlow::new(provider, store.clone());
        let user = flow.sign_up(&form("asha@example.com"), None).await.unwrap();

        let mut asha = employee("e1", "EMP-0001", "Asha");
        asha.user_id = Some(user.id.clone());
        store.insert_employee(&asha).await.unwrap();
        store.insert_employee(&employee("e2", "EMP-0002", "Arjun")).await.unwrap();

        let SignInOutcome::SignedIn(context) = flow.sign_in("asha@example.com", "secret1").await.unwrap() else {
            panic!("MFA should not be required");
        };
        assert_eq!(context.employee_id.as_deref(), Some("e1"));
        let actor = context.actor();
        assert!(actor.is_self("e1"));

        let leave = LeaveService::new(store.clone(), ActivityLog::new(store.clone()));
        let application = |employee_id: &str| LeaveApplication {
            employee_id: employee_id.to_string(),
            leave_type: LeaveType::Casual,
            from_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            reason: "Family function".to_string(),
            attachment_url: None,
        };
        let request = leave.submit(&actor, application("e1")).await.unwrap();
        assert_eq!(request.employee_id, "e1");
        assert!(leave.submit(&actor, application("e2")).await.is_err());

        let own = leave.list(&actor, &LeaveFilter::default()).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, request.id);
    }

    #[tokio::test]
    async fn test_mfa_unavailable() {
        let (flow, provider, _) = setup();
        assert_eq!(provider.mfa_enroll().await.unwrap_err(), ProviderError::MfaUnavailable);
        assert_eq!(flow.verify_mfa("123456").await.unwrap_err(), AuthError::NoMfaFactor);
    }

    #[tokio::test]
    async fn test_expired_session_is_cleared() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let provider = Arc::new(LocalIdentityProvider::new(
            store.clone(),
            JwtManager::new("test-secret-0123456789", -600),
        ));
        let flow = AuthFlow::new(provider.clone(), store);
        flow.sign_up(&form("asha@example.com"), None).await.unwrap();
        flow.sign_in("asha@example.com", "secret1").await.unwrap();

        assert!(flow.current().await.unwrap().is_none());
        assert!(provider.subscribe().borrow().is_none());
    }
}
