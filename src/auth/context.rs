// Per-request authorization context

use uuid::Uuid;

use crate::auth::error::AuthError;

/// Who is making the current request
///
/// Built once per request from the bearer token. An absent, malformed or
/// expired token is not an error at this layer; it simply yields
/// `Anonymous` and the handler that needs an identity decides what to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Authenticated { account_id: Uuid },
}

impl AuthContext {
    pub fn account_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::Anonymous => None,
            AuthContext::Authenticated { account_id } => Some(*account_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.account_id().is_some()
    }

    /// True when the requester owns a resource belonging to `owner`
    pub fn is_owner(&self, owner: Uuid) -> bool {
        self.account_id() == Some(owner)
    }

    /// The authenticated account id, or `Unauthenticated`
    pub fn require(&self) -> Result<Uuid, AuthError> {
        self.account_id().ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_context() {
        let context = AuthContext::default();
        assert_eq!(context, AuthContext::Anonymous);
        assert!(!context.is_authenticated());
        assert!(!context.is_owner(Uuid::new_v4()));
        assert!(matches!(context.require(), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_authenticated_context_ownership() {
        let account_id = Uuid::new_v4();
        let context = AuthContext::Authenticated { account_id };

        assert!(context.is_authenticated());
        assert!(context.is_owner(account_id));
        assert!(!context.is_owner(Uuid::new_v4()));
        assert_eq!(context.require().unwrap(), account_id);
    }
}
