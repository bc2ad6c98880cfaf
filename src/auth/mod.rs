// Authentication module
// Password hashing, stateless JWT sessions, and the per-request auth context

pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use context::AuthContext;
pub use error::{AuthError, FieldError};
pub use handlers::{login_handler, me_handler, signup_handler};
pub use middleware::{populate_auth_context, AuthenticatedUser};
pub use models::{Account, AccountSummary, LoginRequest, LoginResponse, SignupRequest, SignupResponse};
pub use password::PasswordService;
pub use repository::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};
pub use service::AuthService;
pub use token::TokenService;
