use anyhow::{anyhow, Context};
use sqlx::{Pool, Postgres};

/// Shared database connection type for the project.
pub type Connection = Pool<Postgres>;

/// Best-effort: load environment variables from .env, falling back to the
/// checked-in example file.
fn load_env_best_effort() {
    let _ = dotenvy::from_filename(".env").or_else(|_| dotenvy::from_filename(".env.example"));
}

/// Initialize a Postgres connection pool from `DATABASE_URL`.
///
/// The pool connects lazily so the server can start before the database is
/// reachable; the first query pays the connection cost.
pub fn pool_from_env() -> anyhow::Result<Connection> {
    load_env_best_effort();

    let url = std::env::var("DATABASE_URL").map_err(|_| {
        anyhow!("DATABASE_URL not set. Ensure .env exists or copy from .env.example.")
    })?;

    pool_for_url(&url)
}

/// Build a lazy pool for an explicit URL. `NP_DB_MAX_CONNS` caps the pool.
pub fn pool_for_url(url: &str) -> anyhow::Result<Connection> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(
            std::env::var("NP_DB_MAX_CONNS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8),
        )
        .connect_lazy(url)
        .with_context(|| format!("failed to create Postgres pool (lazy) for URL '{}'", url))?;
    Ok(pool)
}
