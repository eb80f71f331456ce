use anyhow::Context;
use dotenvy::dotenv;
use tracing::level_filters::LevelFilter;

use np_server::router::build_router;
use np_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env if present.
    let _ = dotenv();

    let level = std::env::var("NP_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .compact()
        .init();

    let pool = np_database::init::pool_from_env()?;

    // Schema setup is opt-in: deployments normally run it once from an
    // operator shell, not on every boot.
    if std::env::var("NP_ENSURE_SCHEMA").map(|v| v == "1").unwrap_or(false) {
        np_database::schema::ensure_schema(&pool).await?;
        tracing::info!("database schema ensured");
    }

    let page_size: u32 = std::env::var("NP_PAGE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);

    let addr = std::env::var("NP_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, page_size, "netpulse API listening");

    axum::serve(listener, build_router(AppState::new(pool, page_size))).await?;
    Ok(())
}
