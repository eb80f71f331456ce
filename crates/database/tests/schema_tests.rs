use anyhow::Result;
use np_database::init::pool_from_env;
use np_database::schema::ensure_schema;

// Helper: return early if DATABASE_URL is not set, to avoid a hard
// dependency on a database in CI.
fn require_db() -> Option<()> {
    std::env::var("DATABASE_URL").ok()?;
    // Test databases are stock Postgres.
    std::env::set_var("NP_PLAIN_TABLES", "1");
    Some(())
}

#[tokio::test]
async fn ensure_schema_is_idempotent() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = pool_from_env()?;
    ensure_schema(&pool).await?;
    // A second run must be a no-op, not an error.
    ensure_schema(&pool).await?;
    Ok(())
}

#[tokio::test]
async fn schema_accepts_reference_rows() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = pool_from_env()?;
    ensure_schema(&pool).await?;

    sqlx::query("DELETE FROM asn WHERE number = $1")
        .bind(64511i64)
        .execute(&pool)
        .await?;
    sqlx::query(
        "INSERT INTO asn(number, name, tartiflette, disco, ashash) VALUES ($1, $2, TRUE, FALSE, TRUE)",
    )
    .bind(64511i64)
    .bind("SCHEMA-TEST-AS")
    .execute(&pool)
    .await?;

    let row: (String,) = sqlx::query_as("SELECT name FROM asn WHERE number = $1")
        .bind(64511i64)
        .fetch_one(&pool)
        .await?;
    assert_eq!(row.0, "SCHEMA-TEST-AS");

    sqlx::query("DELETE FROM asn WHERE number = $1")
        .bind(64511i64)
        .execute(&pool)
        .await?;
    Ok(())
}
