// HTTP handlers for authentication endpoints

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{AccountSummary, LoginRequest, LoginResponse, SignupRequest, SignupResponse},
    service::AuthService,
};

/// Register a new account
/// POST /signup
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = SignupResponse),
        (status = 400, description = "Field validation failed or the user already exists"),
        (status = 500, description = "Internal server error", body = crate::auth::error::MessageBody)
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(service): State<Arc<AuthService>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>, AuthError> {
    let Json(request) = payload?;
    let response = service.signup(request).await?;
    Ok(Json(response))
}

/// Log in to an existing account
/// POST /login
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Field validation failed or invalid credentials", body = crate::auth::error::MessageBody),
        (status = 500, description = "Internal server error", body = crate::auth::error::MessageBody)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(request) = payload?;
    let response = service.login(request).await?;
    Ok(Json(response))
}

/// Get the account behind the bearer token
/// GET /me
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current account", body = AccountSummary),
        (status = 401, description = "No valid bearer token", body = crate::auth::error::MessageBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(service): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> Result<Json<AccountSummary>, AuthError> {
    let account = service.current_account(user.account_id).await?;
    Ok(Json(account))
}
