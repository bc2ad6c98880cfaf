pub mod auth;
pub mod config;
pub mod db;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    error::{FieldError, MessageBody, ValidationErrorBody},
    models::{AccountSummary, LoginRequest, LoginResponse, SignupRequest, SignupResponse},
    AuthService, CredentialStore, PasswordService, TokenService,
};
use config::Config;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::signup_handler,
        auth::handlers::login_handler,
        auth::handlers::me_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            SignupResponse,
            LoginResponse,
            AccountSummary,
            FieldError,
            ValidationErrorBody,
            MessageBody
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Signup, login and session endpoints")
    ),
    info(
        title = "Book Club Auth API",
        version = "1.0.0",
        description = "Account registration and bearer-token sessions for the book club"
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
///
/// Built once at startup; everything inside is read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: PasswordService,
        tokens: Arc<TokenService>,
        store_timeout: Duration,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            store,
            passwords,
            tokens.clone(),
            store_timeout,
        ));
        Self { auth, tokens }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Transport-level settings for the router
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cors_origins: Vec<HeaderValue>,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cors_origins: vec![HeaderValue::from_static("http://localhost:5173")],
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for HttpSettings {
    fn from(config: &Config) -> Self {
        Self {
            cors_origins: config.cors_origins.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

/// Creates and configures the application router
///
/// The auth context middleware runs once per request on every API route.
pub fn create_router(state: AppState, settings: &HttpSettings) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(settings.cors_origins.clone()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let api = Router::new()
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/me", get(auth::me_handler))
        .layer(from_fn_with_state(
            state.tokens.clone(),
            auth::populate_auth_context,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
