use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

use np_database::filter::PageWindow;
use np_database::init::{pool_from_env, Connection};
use np_database::schema::ensure_schema;
use np_types::disco::{DiscoEventsQuery, DiscoProbesQuery};
use np_types::hegemony::{HegemonyConesQuery, HegemonyQuery};
use np_types::network::{NetworksQuery, OpenTimeRange, TimeRange};
use np_types::traceroute::TrHegemonyQuery;

// Helper: return early if DATABASE_URL is not set, to avoid a hard
// dependency on a database in CI.
fn require_db() -> Option<()> {
    std::env::var("DATABASE_URL").ok()?;
    std::env::set_var("NP_PLAIN_TABLES", "1");
    Some(())
}

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().unwrap()
}

async fn setup() -> Result<Connection> {
    let pool = pool_from_env()?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

async fn seed_asn(pool: &Connection, number: i64, name: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO asn(number, name, tartiflette, disco, ashash) \
         VALUES ($1, $2, TRUE, TRUE, TRUE) \
         ON CONFLICT (number) DO UPDATE SET name = EXCLUDED.name",
    )
    .bind(number)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(())
}

// Each test works in its own ASN sub-range of the documentation block so
// concurrently running tests never see each other's rows.

#[tokio::test]
async fn networks_filters_and_search() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = setup().await?;
    sqlx::query("DELETE FROM asn WHERE number BETWEEN 64500 AND 64503")
        .execute(&pool)
        .await?;
    seed_asn(&pool, 64500, "Query Test Transit").await?;
    seed_asn(&pool, 64501, "Query Test Eyeball").await?;
    seed_asn(&pool, 64502, "Unrelated Network").await?;

    // Substring name filter, case-insensitive.
    let q = NetworksQuery {
        name: Some("query test".to_string()),
        numbers: Some(vec![64500, 64501, 64502]),
        ..Default::default()
    };
    let page = np_database::networks::networks(&pool, &q, PageWindow::new(1, 100)).await?;
    assert_eq!(page.total, 2);
    assert!(page.rows.iter().all(|r| r.name.contains("Query Test")));

    // Number range.
    let q = NetworksQuery {
        numbers: Some(vec![64500, 64501, 64502]),
        number_gte: Some(64501),
        ..Default::default()
    };
    let page = np_database::networks::networks(&pool, &q, PageWindow::new(1, 100)).await?;
    assert_eq!(page.total, 2);

    // `AS`-prefixed search matches the numeric part.
    let q = NetworksQuery {
        search: Some("AS64500".to_string()),
        ..Default::default()
    };
    let page = np_database::networks::networks(&pool, &q, PageWindow::new(1, 100)).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].number, 64500);

    sqlx::query("DELETE FROM asn WHERE number BETWEEN 64500 AND 64503")
        .execute(&pool)
        .await?;
    Ok(())
}

#[tokio::test]
async fn hegemony_scores_filter_join_and_count() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = setup().await?;
    sqlx::query("DELETE FROM hegemony WHERE originasn BETWEEN 64510 AND 64519")
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM asn WHERE number BETWEEN 64510 AND 64519")
        .execute(&pool)
        .await?;
    seed_asn(&pool, 64510, "Dependent Net").await?;
    seed_asn(&pool, 64511, "Transit Net").await?;

    let t0 = utc(2023, 6, 5, 0);
    let t1 = utc(2023, 6, 5, 8);
    for (timebin, asn, hege) in [(t0, 64511i64, 0.8f64), (t1, 64511, 0.9), (t1, 64512, 0.1)] {
        sqlx::query(
            "INSERT INTO hegemony(timebin, hege, af, asn, originasn) VALUES ($1, $2, 4, $3, $4)",
        )
        .bind(timebin)
        .bind(hege)
        .bind(asn)
        .bind(64510i64)
        .execute(&pool)
        .await?;
    }

    let q = HegemonyQuery {
        timebin: TimeRange { gte: t0, lte: t1 },
        asns: None,
        originasns: Some(vec![64510]),
        af: Some(4),
        hege: None,
        hege_gte: Some(0.5),
        hege_lte: None,
        ordering: Some("hege".to_string()),
    };
    let page = np_database::hegemony::scores(&pool, &q, PageWindow::new(1, 100)).await?;
    assert_eq!(page.total, 2);
    // Ordered by hege ascending.
    assert_eq!(page.rows[0].hege, 0.8);
    assert_eq!(page.rows[1].hege, 0.9);
    // Names resolved through the joins; AS64512 has no reference row.
    assert_eq!(page.rows[0].asn_name, "Transit Net");
    assert_eq!(page.rows[0].originasn_name, "Dependent Net");

    let q = HegemonyQuery {
        hege_gte: None,
        asns: Some(vec![64512]),
        originasns: None,
        ..q
    };
    let page = np_database::hegemony::scores(&pool, &q, PageWindow::new(1, 100)).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].asn_name, "");

    sqlx::query("DELETE FROM hegemony WHERE originasn BETWEEN 64510 AND 64519")
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM asn WHERE number BETWEEN 64510 AND 64519")
        .execute(&pool)
        .await?;
    Ok(())
}

#[tokio::test]
async fn cone_pagination_arithmetic() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = setup().await?;
    sqlx::query("DELETE FROM hegemony_cone WHERE asn = 64520")
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM asn WHERE number = 64520")
        .execute(&pool)
        .await?;
    seed_asn(&pool, 64520, "Cone Net").await?;

    let t0 = utc(2023, 6, 1, 0);
    for hour in 0..7 {
        sqlx::query(
            "INSERT INTO hegemony_cone(timebin, conesize, af, asn) VALUES ($1, $2, 4, 64520)",
        )
        .bind(t0 + chrono::Duration::hours(hour))
        .bind(hour as i32 + 1)
        .execute(&pool)
        .await?;
    }

    let q = HegemonyConesQuery {
        timebin: TimeRange {
            gte: t0,
            lte: t0 + chrono::Duration::days(1),
        },
        asns: Some(vec![64520]),
        af: None,
        ordering: None,
    };
    // 7 rows, page size 3: pages of 3, 3, 1; count is the filtered total.
    let first = np_database::hegemony::cones(&pool, &q, PageWindow::new(1, 3)).await?;
    assert_eq!(first.total, 7);
    assert_eq!(first.rows.len(), 3);
    let second = np_database::hegemony::cones(&pool, &q, PageWindow::new(2, 3)).await?;
    assert_eq!(second.rows.len(), 3);
    let third = np_database::hegemony::cones(&pool, &q, PageWindow::new(3, 3)).await?;
    assert_eq!(third.rows.len(), 1);
    // Default ordering is timebin, so the pages tile without overlap.
    assert_eq!(first.rows[0].conesize, 1);
    assert_eq!(second.rows[0].conesize, 4);
    assert_eq!(third.rows[0].conesize, 7);

    sqlx::query("DELETE FROM hegemony_cone WHERE asn = 64520")
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM asn WHERE number = 64520")
        .execute(&pool)
        .await?;
    Ok(())
}

#[tokio::test]
async fn tr_hegemony_defaults_to_latest_timebin() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = setup().await?;
    sqlx::query(
        "DELETE FROM tr_hegemony WHERE origin_id IN \
         (SELECT id FROM tr_hegemony_identifier WHERE name LIKE 'qt-tr-%')",
    )
    .execute(&pool)
    .await?;
    sqlx::query("DELETE FROM tr_hegemony_identifier WHERE name LIKE 'qt-tr-%'")
        .execute(&pool)
        .await?;

    let origin: (i64,) = sqlx::query_as(
        "INSERT INTO tr_hegemony_identifier(name, type, af) VALUES ('qt-tr-origin', 'AS', 4) RETURNING id",
    )
    .fetch_one(&pool)
    .await?;
    let dependency: (i64,) = sqlx::query_as(
        "INSERT INTO tr_hegemony_identifier(name, type, af) VALUES ('qt-tr-dep', 'IX', 4) RETURNING id",
    )
    .fetch_one(&pool)
    .await?;

    let old = utc(2023, 5, 1, 0);
    let latest = utc(2023, 5, 29, 0);
    for (timebin, hege) in [(old, 0.2f64), (latest, 0.6)] {
        sqlx::query(
            "INSERT INTO tr_hegemony(timebin, hege, af, nbsamples, dependency_id, origin_id) \
             VALUES ($1, $2, 4, 25, $3, $4)",
        )
        .bind(timebin)
        .bind(hege)
        .bind(dependency.0)
        .bind(origin.0)
        .execute(&pool)
        .await?;
    }

    // No time filter: only rows at the table's max timebin are returned.
    // The shared table may hold other tests' rows, so pin to our origin.
    let q = TrHegemonyQuery {
        timebin: OpenTimeRange::default(),
        origin_names: Some(vec!["qt-tr-origin".to_string()]),
        ..Default::default()
    };
    let page = np_database::tr_hegemony::dependencies(&pool, &q, PageWindow::new(1, 100)).await?;
    let latest_in_table: (Option<DateTime<Utc>>,) =
        sqlx::query_as("SELECT MAX(timebin) FROM tr_hegemony")
            .fetch_one(&pool)
            .await?;
    if latest_in_table.0 == Some(latest) {
        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0].hege, 0.6);
        assert_eq!(page.rows[0].origin_name, "qt-tr-origin");
        assert_eq!(page.rows[0].dependency_type, "IX");
    } else {
        // Another fixture owns a newer timebin; our rows are filtered out.
        assert_eq!(page.total, 0);
    }

    // An explicit range returns both of our rows.
    let q = TrHegemonyQuery {
        timebin: OpenTimeRange {
            exact: None,
            gte: Some(old),
            lte: Some(latest),
        },
        origin_names: Some(vec!["qt-tr-origin".to_string()]),
        ..Default::default()
    };
    let page = np_database::tr_hegemony::dependencies(&pool, &q, PageWindow::new(1, 100)).await?;
    assert_eq!(page.total, 2);

    sqlx::query("DELETE FROM tr_hegemony WHERE origin_id = $1")
        .bind(origin.0)
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM tr_hegemony_identifier WHERE name LIKE 'qt-tr-%'")
        .execute(&pool)
        .await?;
    Ok(())
}

#[tokio::test]
async fn disco_events_embed_their_probes() -> Result<()> {
    if require_db().is_none() {
        return Ok(());
    }
    let pool = setup().await?;
    sqlx::query(
        "DELETE FROM disco_events WHERE streamname LIKE 'qt-disco-%'",
    )
    .execute(&pool)
    .await?;

    let start = utc(2023, 7, 1, 0);
    let end = utc(2023, 7, 1, 2);
    let event: (i64,) = sqlx::query_as(
        "INSERT INTO disco_events(streamtype, streamname, starttime, endtime, avglevel, \
         nbdiscoprobes, totalprobes) VALUES ('asn', 'qt-disco-64530', $1, $2, 12.5, 2, 40) \
         RETURNING id",
    )
    .bind(start)
    .bind(end)
    .fetch_one(&pool)
    .await?;
    for probe_id in [1001, 1002] {
        sqlx::query(
            "INSERT INTO disco_probes(probe_id, starttime, endtime, level, ipv4, prefixv4, \
             lat, lon, event_id) VALUES ($1, $2, $3, 12.5, '192.0.2.1', '192.0.2.0/24', \
             35.6, 139.7, $4)",
        )
        .bind(probe_id)
        .bind(start)
        .bind(end)
        .bind(event.0)
        .execute(&pool)
        .await?;
    }

    let q = DiscoEventsQuery {
        streamname: Some("qt-disco-64530".to_string()),
        avglevel_gte: Some(10.0),
        ..Default::default()
    };
    let page = np_database::disco::events(&pool, &q, PageWindow::new(1, 100)).await?;
    assert_eq!(page.total, 1);
    let event_row = &page.rows[0];
    assert_eq!(event_row.streamtype, "asn");
    assert_eq!(event_row.discoprobes.len(), 2);
    assert!(event_row.discoprobes.iter().all(|p| p.event == event.0));

    // The flat probe listing filters independently of events.
    let q = DiscoProbesQuery {
        event: Some(event.0),
        probe_ids: Some(vec![1001]),
        ..Default::default()
    };
    let page = np_database::disco::probes(&pool, &q, PageWindow::new(1, 100)).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].probe_id, 1001);

    // Cascades through the FK.
    sqlx::query("DELETE FROM disco_events WHERE id = $1")
        .bind(event.0)
        .execute(&pool)
        .await?;
    let leftovers: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM disco_probes WHERE event_id = $1")
            .bind(event.0)
            .fetch_one(&pool)
            .await?;
    assert_eq!(leftovers.0, 0);
    Ok(())
}
