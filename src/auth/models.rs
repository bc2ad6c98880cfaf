// Account data models and request/response DTOs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Stored account record
#[derive(Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[redacted]")
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Values needed to insert a new account
#[derive(Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub username: Option<String>,
}

/// Minimal account summary returned to clients (never includes the digest)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountSummary {
    pub id: Uuid,
    #[schema(example = "a@x.com")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            username: account.username,
        }
    }
}

/// Signup request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    #[schema(example = "a@x.com")]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    #[schema(example = "abcdef")]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters long"))]
    pub username: Option<String>,
}

/// Login request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    #[schema(example = "a@x.com")]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "abcdef")]
    pub password: String,
}

/// Signup response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub token: String,
}

/// Login response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountSummary,
}

/// Canonical form of an email used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
