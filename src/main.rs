use std::sync::Arc;

use bookclub_auth::{
    auth::{PasswordService, PgCredentialStore, TokenService},
    config::Config,
    create_router, db, AppState, HttpSettings,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    tracing::info!("Book Club Auth - Starting...");

    // A missing JWT_SECRET or DATABASE_URL stops startup here
    let config = Config::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let pool = db::connect_with_retry(&config.database).await?;
    db::run_migrations(&pool).await?;

    let passwords = PasswordService::new(config.hash)?;
    let tokens = Arc::new(TokenService::new(&config.jwt_secret));
    let state = AppState::new(
        Arc::new(PgCredentialStore::new(pool)),
        passwords,
        tokens,
        config.store_timeout,
    );

    let app = create_router(state, &HttpSettings::from(&config));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Book Club Auth is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
