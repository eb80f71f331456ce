use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

use np_types::atlas::{
    LocationRow, LocationsQuery, NetworkDelayAlarmRow, NetworkDelayAlarmsQuery, NetworkDelayQuery,
    NetworkDelayRow, PointFilter,
};
use np_types::wire::Page;

use crate::filter::{parse_ordering, push_open_time_filter, push_page_clause, PageWindow};
use crate::init::Connection;

const DELAY_ORDERABLE: &[&str] = &["timebin", "median", "nbtracks", "nbprobes", "entropy", "hop"];
const ALARMS_ORDERABLE: &[&str] = &["timebin", "deviation"];
const LOCATIONS_ORDERABLE: &[&str] = &["name", "type", "af"];

/// Both delay tables join `atlas_location` twice; `s` is the start point,
/// `e` the end point.
const DELAY_FROM: &str = " FROM atlas_delay d \
     JOIN atlas_location s ON s.id = d.startpoint_id \
     JOIN atlas_location e ON e.id = d.endpoint_id";
const ALARMS_FROM: &str = " FROM atlas_delay_alarms d \
     JOIN atlas_location s ON s.id = d.startpoint_id \
     JOIN atlas_location e ON e.id = d.endpoint_id";

/// Append one side's location conditions. `alias` is a static join alias.
fn push_point_filters(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, f: &PointFilter) {
    if let Some(names) = &f.names {
        qb.push(format!(" AND {}.name = ANY(", alias))
            .push_bind(names.clone())
            .push(")");
    }
    if let Some(kind) = &f.kind {
        qb.push(format!(" AND {}.type = ", alias)).push_bind(kind.clone());
    }
    if let Some(af) = f.af {
        qb.push(format!(" AND {}.af = ", alias)).push_bind(af);
    }
    if let Some(keys) = &f.keys {
        if keys.is_empty() {
            return;
        }
        qb.push(" AND (");
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("({}.type = ", alias)).push_bind(key.kind.clone());
            if let Some(af) = key.af {
                qb.push(format!(" AND {}.af = ", alias)).push_bind(af);
            }
            if let Some(name) = &key.name {
                qb.push(format!(" AND {}.name = ", alias)).push_bind(name.clone());
            }
            qb.push(")");
        }
        qb.push(")");
    }
}

fn push_delay_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &NetworkDelayQuery) {
    qb.push(" WHERE TRUE");
    push_open_time_filter(qb, "d", "atlas_delay", &q.timebin);
    push_point_filters(qb, "s", &q.startpoint);
    push_point_filters(qb, "e", &q.endpoint);
    if let Some(median) = q.median {
        qb.push(" AND d.median = ").push_bind(median);
    }
    if let Some(gte) = q.median_gte {
        qb.push(" AND d.median >= ").push_bind(gte);
    }
    if let Some(lte) = q.median_lte {
        qb.push(" AND d.median <= ").push_bind(lte);
    }
}

fn delay_row(r: &PgRow) -> NetworkDelayRow {
    NetworkDelayRow {
        timebin: r.get("timebin"),
        startpoint_type: r.get("startpoint_type"),
        startpoint_name: r.get("startpoint_name"),
        startpoint_af: r.get("startpoint_af"),
        endpoint_type: r.get("endpoint_type"),
        endpoint_name: r.get("endpoint_name"),
        endpoint_af: r.get("endpoint_af"),
        median: r.get("median"),
        nbtracks: r.get("nbtracks"),
        nbprobes: r.get("nbprobes"),
        entropy: r.get("entropy"),
        hop: r.get("hop"),
        nbrealrtts: r.get("nbrealrtts"),
    }
}

/// Median RTT estimates between monitored locations. Without a time filter
/// the latest timebin is served.
pub async fn delays(
    conn: &Connection,
    q: &NetworkDelayQuery,
    window: PageWindow,
) -> Result<Page<NetworkDelayRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(DELAY_FROM);
    push_delay_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT d.timebin, d.median, d.nbtracks, d.nbprobes, d.entropy, d.hop, d.nbrealrtts, \
         s.type AS startpoint_type, s.name AS startpoint_name, s.af AS startpoint_af, \
         e.type AS endpoint_type, e.name AS endpoint_name, e.af AS endpoint_af",
    );
    qb.push(DELAY_FROM);
    push_delay_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), DELAY_ORDERABLE),
        "d",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows.iter().map(delay_row).collect(),
        total,
    })
}

fn push_alarm_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &NetworkDelayAlarmsQuery) {
    qb.push(" WHERE TRUE");
    push_open_time_filter(qb, "d", "atlas_delay_alarms", &q.timebin);
    push_point_filters(qb, "s", &q.startpoint);
    push_point_filters(qb, "e", &q.endpoint);
    if let Some(gte) = q.deviation_gte {
        qb.push(" AND d.deviation >= ").push_bind(gte);
    }
    if let Some(lte) = q.deviation_lte {
        qb.push(" AND d.deviation <= ").push_bind(lte);
    }
}

/// Anomalous delay changes between monitored locations.
pub async fn alarms(
    conn: &Connection,
    q: &NetworkDelayAlarmsQuery,
    window: PageWindow,
) -> Result<Page<NetworkDelayAlarmRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(ALARMS_FROM);
    push_alarm_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT d.timebin, d.deviation, \
         s.type AS startpoint_type, s.name AS startpoint_name, s.af AS startpoint_af, \
         e.type AS endpoint_type, e.name AS endpoint_name, e.af AS endpoint_af",
    );
    qb.push(ALARMS_FROM);
    push_alarm_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), ALARMS_ORDERABLE),
        "d",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| NetworkDelayAlarmRow {
                timebin: r.get("timebin"),
                startpoint_type: r.get("startpoint_type"),
                startpoint_name: r.get("startpoint_name"),
                startpoint_af: r.get("startpoint_af"),
                endpoint_type: r.get("endpoint_type"),
                endpoint_name: r.get("endpoint_name"),
                endpoint_af: r.get("endpoint_af"),
                deviation: r.get("deviation"),
            })
            .collect(),
        total,
    })
}

fn push_location_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &LocationsQuery) {
    qb.push(" WHERE TRUE");
    if let Some(name) = &q.name {
        qb.push(" AND l.name ILIKE ").push_bind(format!("%{}%", name));
    }
    if let Some(kind) = &q.kind {
        qb.push(" AND l.type = ").push_bind(kind.clone());
    }
    if let Some(af) = q.af {
        qb.push(" AND l.af = ").push_bind(af);
    }
}

/// Locations monitored for network delay.
pub async fn locations(
    conn: &Connection,
    q: &LocationsQuery,
    window: PageWindow,
) -> Result<Page<LocationRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM atlas_location l");
    push_location_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new("SELECT l.type, l.name, l.af FROM atlas_location l");
    push_location_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), LOCATIONS_ORDERABLE),
        "l",
        "name",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| LocationRow {
                kind: r.get("type"),
                name: r.get("name"),
                af: r.get("af"),
            })
            .collect(),
        total,
    })
}
