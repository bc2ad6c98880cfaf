// Credential store: persistent mapping from email to account

use std::collections::HashMap;

use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{Account, NewAccount},
};

/// Storage for accounts
///
/// Email uniqueness is the store's job: `insert` must fail with
/// `AuthError::UserExists` atomically, never via a separate lookup.
/// Emails reach the store already normalized.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create a new account
    async fn insert(&self, account: NewAccount) -> Result<Account, AuthError>;

    /// Find an account by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    /// Find an account by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError>;
}

/// Postgres-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new PgCredentialStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, account: NewAccount) -> Result<Account, AuthError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash, username)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, username, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The unique index on LOWER(email) is the only uniqueness check
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::UserExists;
                }
            }
            AuthError::Dependency(format!("account insert failed: {}", e))
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, username, created_at FROM accounts WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Dependency(format!("account lookup failed: {}", e)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
        sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, username, created_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Dependency(format!("account lookup failed: {}", e)))
    }
}

/// In-process credential store keyed by email
#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert(&self, account: NewAccount) -> Result<Account, AuthError> {
        use std::collections::hash_map::Entry;

        let mut accounts = self.accounts.write().await;
        match accounts.entry(account.email.to_lowercase()) {
            Entry::Occupied(_) => Err(AuthError::UserExists),
            Entry::Vacant(slot) => {
                let stored = Account {
                    id: Uuid::new_v4(),
                    email: account.email,
                    password_hash: account.password_hash,
                    username: account.username,
                    created_at: Utc::now(),
                };
                Ok(slot.insert(stored).clone())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.read().await.get(&email.to_lowercase()).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.id == id)
            .cloned())
    }
}
