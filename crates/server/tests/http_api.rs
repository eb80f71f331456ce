use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use np_server::router::build_router;
use np_server::state::AppState;

// Validation failures are rejected before any query runs, so those tests use
// a lazy pool that never connects. Contract tests against real data are
// gated on DATABASE_URL like the database suite.
fn state_without_db(page_size: u32) -> AppState {
    let pool = np_database::init::pool_for_url("postgres://localhost:1/unused").unwrap();
    AppState::new(pool, page_size)
}

fn require_db() -> Option<()> {
    std::env::var("DATABASE_URL").ok()?;
    std::env::set_var("NP_PLAIN_TABLES", "1");
    Some(())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("host", "ihr.example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn detail(body: &serde_json::Value) -> &str {
    body["detail"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn root_serves_the_endpoint_index() {
    let app = build_router(state_without_db(100));
    let (status, body) = get_json(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "netpulse API");
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "/hegemony"));
}

#[tokio::test]
async fn hegemony_requires_a_timebin() {
    let app = build_router(state_without_db(100));
    let (status, body) = get_json(app, "/hegemony/?asn=2497").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).starts_with("No timebin parameter."));
}

#[tokio::test]
async fn hegemony_rejects_half_open_ranges() {
    let app = build_router(state_without_db(100));
    let (status, body) =
        get_json(app, "/hegemony/?asn=2497&timebin__gte=2023-06-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).starts_with("Invalid timebin range."));
}

#[tokio::test]
async fn hegemony_rejects_ranges_past_the_ceiling() {
    let app = build_router(state_without_db(100));
    let (status, body) = get_json(
        app,
        "/hegemony/?asn=2497&timebin__gte=2023-06-01&timebin__lte=2023-06-20",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).contains("timebin range is too large"));
}

#[tokio::test]
async fn hegemony_requires_asn_or_originasn() {
    let app = build_router(state_without_db(100));
    let (status, body) = get_json(app, "/hegemony/?timebin=2023-06-05T00:00:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).contains("['originasn', 'asn']"));
}

#[tokio::test]
async fn hegemony_countries_gets_the_wider_ceiling() {
    let app = build_router(state_without_db(100));
    // 20 days is past the 7-day ceiling of /hegemony but within the 31 days
    // allowed for countries; the request must fail on the missing country
    // filter instead.
    let (status, body) = get_json(
        app,
        "/hegemony/countries/?timebin__gte=2023-06-01&timebin__lte=2023-06-20",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).contains("['country', 'asn']"));
}

#[tokio::test]
async fn malformed_list_values_are_rejected() {
    let app = build_router(state_without_db(100));
    let (status, body) =
        get_json(app, "/hegemony/?timebin=2023-06-05&asn=2497,abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).contains("Invalid value 'abc'"));
}

#[tokio::test]
async fn prefixes_require_a_narrowing_filter() {
    let app = build_router(state_without_db(100));
    let (status, body) = get_json(app, "/hegemony/prefixes/?timebin=2023-06-05").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).contains("'delegated_asn_status'"));
}

#[tokio::test]
async fn networks_contract_pagination_and_filters() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = np_database::init::pool_from_env()?;
    np_database::schema::ensure_schema(&pool).await?;
    sqlx::query("DELETE FROM asn WHERE number BETWEEN 64540 AND 64549")
        .execute(&pool)
        .await?;
    for (number, name) in [
        (64540i64, "Contract Test Net A"),
        (64541, "Contract Test Net B"),
        (64542, "Contract Test Net C"),
    ] {
        sqlx::query(
            "INSERT INTO asn(number, name, tartiflette, disco, ashash) \
             VALUES ($1, $2, FALSE, FALSE, TRUE)",
        )
        .bind(number)
        .bind(name)
        .execute(&pool)
        .await?;
    }

    // Page size 2: three matching rows span two pages.
    let state = AppState::new(pool.clone(), 2);
    let app = build_router(state);

    let (status, body) =
        get_json(app.clone(), "/networks/?name=contract+test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["previous"], serde_json::Value::Null);
    let next = body["next"].as_str().unwrap();
    assert!(next.starts_with("http://ihr.example.org/networks/"));
    assert!(next.contains("page=2"));
    assert_eq!(body["results"][0]["hegemony"], true);
    assert_eq!(body["results"][0]["delay_forwarding"], false);

    let (status, body) = get_json(app.clone(), "/networks/?name=contract+test&page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["next"], serde_json::Value::Null);
    assert!(body["previous"].as_str().unwrap().contains("page=1"));

    sqlx::query("DELETE FROM asn WHERE number BETWEEN 64540 AND 64549")
        .execute(&pool)
        .await?;
    Ok(())
}

#[tokio::test]
async fn link_delay_contract_rows_satisfy_filters() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = np_database::init::pool_from_env()?;
    np_database::schema::ensure_schema(&pool).await?;
    sqlx::query("DELETE FROM delay WHERE asn BETWEEN 64550 AND 64559")
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM asn WHERE number BETWEEN 64550 AND 64559")
        .execute(&pool)
        .await?;
    sqlx::query(
        "INSERT INTO asn(number, name, tartiflette, disco, ashash) \
         VALUES (64550, 'Delay Test Net', TRUE, FALSE, FALSE)",
    )
    .execute(&pool)
    .await?;
    for (hour, magnitude) in [(0, 1.5f64), (1, 4.5), (2, 0.0)] {
        sqlx::query("INSERT INTO delay(timebin, magnitude, asn) VALUES ($1, $2, 64550)")
            .bind(format!("2023-06-05T0{}:00:00Z", hour).parse::<chrono::DateTime<chrono::Utc>>()?)
            .bind(magnitude)
            .execute(&pool)
            .await?;
    }

    let app = build_router(AppState::new(pool.clone(), 100));
    let (status, body) = get_json(
        app,
        "/link/delay/?timebin__gte=2023-06-05T00:00:00&timebin__lte=2023-06-05T06:00:00&asn=64550",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    for row in body["results"].as_array().unwrap() {
        assert_eq!(row["asn"], 64550);
        assert_eq!(row["asn_name"], "Delay Test Net");
    }

    sqlx::query("DELETE FROM delay WHERE asn BETWEEN 64550 AND 64559")
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM asn WHERE number BETWEEN 64550 AND 64559")
        .execute(&pool)
        .await?;
    Ok(())
}
