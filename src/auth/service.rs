// Authentication service - business logic layer

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{
        normalize_email, AccountSummary, LoginRequest, LoginResponse, NewAccount, SignupRequest,
        SignupResponse,
    },
    password::PasswordService,
    repository::CredentialStore,
    token::TokenService,
};

/// Authentication service coordinating signup and login
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordService,
    tokens: Arc<TokenService>,
    store_timeout: Duration,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: PasswordService,
        tokens: Arc<TokenService>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            passwords,
            tokens,
            store_timeout,
        }
    }

    /// Register a new account and issue its first token
    pub async fn signup(&self, mut request: SignupRequest) -> Result<SignupResponse, AuthError> {
        request.email = normalize_email(&request.email);
        request.username = request.username.map(|name| name.trim().to_string());
        request.validate()?;

        let email = request.email;
        let username = request.username;

        let password_hash = self.passwords.hash_password_blocking(request.password).await?;

        let account = self
            .with_timeout(self.store.insert(NewAccount {
                email,
                password_hash,
                username,
            }))
            .await
            .map_err(|e| {
                if matches!(e, AuthError::UserExists) {
                    debug!("Signup rejected: account already exists");
                }
                e
            })?;

        let token = self.tokens.issue(account.id)?;
        info!("Account created: {}", account.id);

        Ok(SignupResponse { token })
    }

    /// Authenticate an account and issue a token
    ///
    /// An unknown email and a wrong password produce the same error, and both
    /// paths perform exactly one password verification.
    pub async fn login(&self, mut request: LoginRequest) -> Result<LoginResponse, AuthError> {
        request.email = normalize_email(&request.email);
        request.validate()?;

        let email = request.email;
        let account = self.with_timeout(self.store.find_by_email(&email)).await?;

        let digest = account.as_ref().map(|a| a.password_hash.clone());
        let matched = self
            .passwords
            .verify_password_blocking(request.password, digest)
            .await?;

        let account = match account {
            Some(account) if matched => account,
            _ => {
                debug!("Login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(account.id)?;
        debug!("Login succeeded: {}", account.id);

        Ok(LoginResponse {
            token,
            user: AccountSummary::from(account),
        })
    }

    /// Get the summary of the account behind an authenticated context
    ///
    /// A token whose account no longer exists is treated as unauthenticated.
    pub async fn current_account(&self, account_id: Uuid) -> Result<AccountSummary, AuthError> {
        self.with_timeout(self.store.find_by_id(account_id))
            .await?
            .map(AccountSummary::from)
            .ok_or(AuthError::Unauthenticated)
    }

    async fn with_timeout<T, F>(&self, operation: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        tokio::time::timeout(self.store_timeout, operation)
            .await
            .map_err(|_| {
                AuthError::Dependency(format!(
                    "credential store did not answer within {:?}",
                    self.store_timeout
                ))
            })?
    }
}
