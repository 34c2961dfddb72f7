use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use bidanku_core::{db, AppConfig, LogMailer};

/// Server entrypoint.
///
/// Resolves configuration from the environment once, opens the database
/// pool, applies migrations, then serves the REST API.
///
/// # Environment Variables
/// - `DATABASE_PATH`: SQLite database file (default: "bidanku.db")
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
/// - `BIND_ADDR`: HTTP listen address (default: "0.0.0.0:3000")
/// - `JWT_SECRET`: token signing secret (required outside development)
/// - `JWT_EXPIRY_MINUTES`, `RESET_TOKEN_EXPIRY_MINUTES`, `OTP_EXPIRY_MINUTES`
/// - `BCRYPT_COST`: password hash cost factor
/// - `APP_ENV`: "production" hides error detail in responses
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bidanku=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(pool, config, Arc::new(LogMailer));
    let app = api_rest::router(state);

    tracing::info!("++ Starting bidanku REST on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
