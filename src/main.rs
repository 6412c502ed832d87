use anyhow::Context;
use portal_guard::{
    AppState,
    config::{AppConfig, Env},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, and serves the guarded router.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (fail fast on anything missing in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load().context("invalid configuration")?;

    // 2. Logging filter: RUST_LOG wins, otherwise verbose guard logs.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portal_guard=debug,tower_http=info,axum=trace".into());

    // 3. Log format follows the environment.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Guard starting in {:?} mode", config.env);
    tracing::info!(
        cookie = %config.token_cookie,
        storage_key = %config.token_storage_key,
        "credential transport"
    );

    // 4. Router and server
    let bind_addr = config.bind_addr;
    let app = create_router(AppState { config });

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
