use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

use super::notifier::ResetCodeNotifier;
use crate::auth::{self, Claims, JwtError, PasswordError};
use crate::config;
use crate::database::models::{reset_code, NewUser, ResetCode, User};
use crate::database::{Store, StoreError};
use crate::types::Role;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("email already registered")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired reset code")]
    InvalidResetCode,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => AccountError::EmailTaken,
            other => AccountError::Store(other),
        }
    }
}

/// Issued on signup and signin
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Account lifecycle: registration, sign-in, password reset and role changes
pub struct AccountService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn ResetCodeNotifier>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn ResetCodeNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Register a new `Student` account and sign it in
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AccountError> {
        let password_hash = auth::hash_password(password.to_string()).await?;
        let user = User::new(
            NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::default(),
            },
            Utc::now(),
        );

        let user = self.store.insert_user(user).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "User registered");

        self.session_for(user)
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !auth::verify_password(password.to_string(), user.password.clone()).await? {
            tracing::warn!(user_id = %user.id, "Sign-in with wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        tracing::debug!(user_id = %user.id, "User signed in");
        self.session_for(user)
    }

    /// Issue a reset code for `email`. Unknown emails succeed silently.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AccountError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let code = reset_code::generate_code();
        let ttl = Duration::minutes(config::config().security.reset_code_ttl_minutes);
        self.store
            .save_reset_code(ResetCode::new(user.id, &code, Utc::now(), ttl))
            .await?;

        if let Err(e) = self.notifier.send_reset_code(&user, &code).await {
            tracing::error!(user_id = %user.id, error = %e, "Reset code delivery failed");
        }
        Ok(())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AccountError::InvalidResetCode)?;

        // The code check and the password write are a single store call
        let password_hash = auth::hash_password(new_password.to_string()).await?;
        let redeemed = self
            .store
            .redeem_reset_code(user.id, code, &password_hash, Utc::now())
            .await?;

        if !redeemed {
            tracing::warn!(user_id = %user.id, "Rejected password reset code");
            return Err(AccountError::InvalidResetCode);
        }

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    /// Overwrite the role of the user registered under `email`
    pub async fn change_role(&self, email: &str, role: Role) -> Result<User, AccountError> {
        let user = self
            .store
            .update_user_role(email, role)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        tracing::info!(user_id = %user.id, role = %role, "User role changed");
        Ok(user)
    }

    fn session_for(&self, user: User) -> Result<Session, AccountError> {
        let token = auth::generate_jwt(&Claims::new(&user))?;
        Ok(Session { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::services::notifier::DeliveryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<(String, String)>>);

    #[async_trait]
    impl ResetCodeNotifier for Outbox {
        async fn send_reset_code(&self, user: &User, code: &str) -> Result<(), DeliveryError> {
            self.0.lock().unwrap().push((user.email.clone(), code.to_string()));
            Ok(())
        }
    }

    fn service() -> (AccountService, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::default());
        let service = AccountService::new(Arc::new(MemoryStore::new()), outbox.clone());
        (service, outbox)
    }

    #[tokio::test]
    async fn signup_creates_student_and_rejects_duplicates() {
        let (accounts, _) = service();

        let session = accounts.signup("Lin", "lin@campus.edu", "secret1").await.unwrap();
        assert_eq!(session.user.role, Role::Student);
        assert!(!session.token.is_empty());

        let err = accounts.signup("Lin", "LIN@campus.edu", "secret2").await.unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));
    }

    #[tokio::test]
    async fn signin_checks_password() {
        let (accounts, _) = service();
        accounts.signup("Lin", "lin@campus.edu", "secret1").await.unwrap();

        assert!(accounts.signin("lin@campus.edu", "secret1").await.is_ok());
        assert!(matches!(
            accounts.signin("lin@campus.edu", "wrong").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.signin("ghost@campus.edu", "secret1").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn reset_flow_replaces_password_once() {
        let (accounts, outbox) = service();
        accounts.signup("Lin", "lin@campus.edu", "secret1").await.unwrap();

        accounts.forgot_password("lin@campus.edu").await.unwrap();
        let (_, code) = outbox.0.lock().unwrap().last().cloned().unwrap();

        assert!(matches!(
            accounts.reset_password("lin@campus.edu", "000000x", "newpass").await,
            Err(AccountError::InvalidResetCode)
        ));

        accounts.reset_password("lin@campus.edu", &code, "newpass").await.unwrap();
        assert!(accounts.signin("lin@campus.edu", "newpass").await.is_ok());

        assert!(matches!(
            accounts.reset_password("lin@campus.edu", &code, "again1").await,
            Err(AccountError::InvalidResetCode)
        ));
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_is_silent() {
        let (accounts, outbox) = service();
        accounts.forgot_password("nobody@campus.edu").await.unwrap();
        assert!(outbox.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn change_role_requires_known_email() {
        let (accounts, _) = service();
        accounts.signup("Lin", "lin@campus.edu", "secret1").await.unwrap();

        let user = accounts.change_role("lin@campus.edu", Role::Hod).await.unwrap();
        assert_eq!(user.role, Role::Hod);

        assert!(matches!(
            accounts.change_role("ghost@campus.edu", Role::Hod).await,
            Err(AccountError::UserNotFound)
        ));
    }
}
