// Auth context middleware and extractors

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{context::AuthContext, error::AuthError, token::TokenService};

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively. Any other scheme, a missing
/// header, or an empty token yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Build the authorization context for a set of request headers
pub fn context_from_headers(tokens: &TokenService, headers: &HeaderMap) -> AuthContext {
    match bearer_token(headers) {
        Some(token) => tokens.verify(token),
        None => AuthContext::Anonymous,
    }
}

/// Middleware that builds the auth context once and stores it in request extensions
pub async fn populate_auth_context(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = context_from_headers(&tokens, request.headers());
    debug!(
        "Auth context for {} {}: {}",
        request.method(),
        request.uri().path(),
        if context.is_authenticated() { "authenticated" } else { "anonymous" }
    );

    request.extensions_mut().insert(context);
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<AuthContext>() {
            return Ok(*context);
        }

        // Route mounted without the middleware
        let tokens = Arc::<TokenService>::from_ref(state);
        let context = context_from_headers(&tokens, &parts.headers);
        parts.extensions.insert(context);
        Ok(context)
    }
}

/// Extractor for handlers that require an authenticated account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = match AuthContext::from_request_parts(parts, state).await {
            Ok(context) => context,
            Err(never) => match never {},
        };

        context.require().map(|account_id| Self { account_id })
    }
}
