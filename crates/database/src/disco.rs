use std::collections::HashMap;

use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

use np_types::disco::{DiscoEventRow, DiscoEventsQuery, DiscoProbeRow, DiscoProbesQuery};
use np_types::wire::Page;

use crate::filter::{parse_ordering, push_page_clause, PageWindow};
use crate::init::Connection;

const EVENTS_ORDERABLE: &[&str] = &[
    "starttime",
    "endtime",
    "avglevel",
    "nbdiscoprobes",
    "totalprobes",
    "streamname",
    "streamtype",
];
const PROBES_ORDERABLE: &[&str] = &["probe_id", "starttime", "endtime", "level"];

fn push_event_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &DiscoEventsQuery) {
    qb.push(" WHERE TRUE");
    if let Some(streamname) = &q.streamname {
        qb.push(" AND ev.streamname = ").push_bind(streamname.clone());
    }
    if let Some(streamtype) = &q.streamtype {
        qb.push(" AND ev.streamtype = ").push_bind(streamtype.clone());
    }
    for (column, value) in [
        (" AND ev.starttime = ", q.starttime),
        (" AND ev.starttime >= ", q.starttime_gte),
        (" AND ev.starttime <= ", q.starttime_lte),
        (" AND ev.endtime = ", q.endtime),
        (" AND ev.endtime >= ", q.endtime_gte),
        (" AND ev.endtime <= ", q.endtime_lte),
    ] {
        if let Some(value) = value {
            qb.push(column).push_bind(value);
        }
    }
    for (column, value) in [
        (" AND ev.avglevel = ", q.avglevel),
        (" AND ev.avglevel >= ", q.avglevel_gte),
        (" AND ev.avglevel <= ", q.avglevel_lte),
    ] {
        if let Some(value) = value {
            qb.push(column).push_bind(value);
        }
    }
    for (column, value) in [
        (" AND ev.nbdiscoprobes = ", q.nbdiscoprobes),
        (" AND ev.nbdiscoprobes >= ", q.nbdiscoprobes_gte),
        (" AND ev.nbdiscoprobes <= ", q.nbdiscoprobes_lte),
        (" AND ev.totalprobes = ", q.totalprobes),
        (" AND ev.totalprobes >= ", q.totalprobes_gte),
        (" AND ev.totalprobes <= ", q.totalprobes_lte),
    ] {
        if let Some(value) = value {
            qb.push(column).push_bind(value);
        }
    }
}

fn probe_row(r: &PgRow) -> DiscoProbeRow {
    DiscoProbeRow {
        probe_id: r.get("probe_id"),
        starttime: r.get("starttime"),
        endtime: r.get("endtime"),
        level: r.get("level"),
        ipv4: r.get("ipv4"),
        prefixv4: r.get("prefixv4"),
        event: r.get("event_id"),
        lat: r.get("lat"),
        lon: r.get("lon"),
    }
}

/// Disconnection events with the affected probes embedded. Probes for the
/// whole page are fetched in one pass and grouped by event.
pub async fn events(
    conn: &Connection,
    q: &DiscoEventsQuery,
    window: PageWindow,
) -> Result<Page<DiscoEventRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM disco_events ev");
    push_event_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT ev.id, ev.streamtype, ev.streamname, ev.starttime, ev.endtime, \
         ev.avglevel, ev.nbdiscoprobes, ev.totalprobes, ev.ongoing FROM disco_events ev",
    );
    push_event_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), EVENTS_ORDERABLE),
        "ev",
        "id",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.get::<i64, _>("id")).collect();
    let mut probes_by_event: HashMap<i64, Vec<DiscoProbeRow>> = HashMap::new();
    if !ids.is_empty() {
        let probe_rows = sqlx::query(
            "SELECT probe_id, starttime, endtime, level, ipv4, prefixv4, lat, lon, event_id \
             FROM disco_probes WHERE event_id = ANY($1) ORDER BY starttime",
        )
        .bind(&ids)
        .fetch_all(conn)
        .await?;
        for r in &probe_rows {
            probes_by_event
                .entry(r.get("event_id"))
                .or_default()
                .push(probe_row(r));
        }
    }

    Ok(Page {
        rows: rows
            .iter()
            .map(|r| {
                let id: i64 = r.get("id");
                DiscoEventRow {
                    id,
                    streamtype: r.get("streamtype"),
                    streamname: r.get("streamname"),
                    starttime: r.get("starttime"),
                    endtime: r.get("endtime"),
                    avglevel: r.get("avglevel"),
                    nbdiscoprobes: r.get("nbdiscoprobes"),
                    totalprobes: r.get("totalprobes"),
                    ongoing: r.get("ongoing"),
                    discoprobes: probes_by_event.remove(&id).unwrap_or_default(),
                }
            })
            .collect(),
        total,
    })
}

fn push_probe_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &DiscoProbesQuery) {
    qb.push(" WHERE TRUE");
    if let Some(probe_ids) = &q.probe_ids {
        qb.push(" AND p.probe_id = ANY(")
            .push_bind(probe_ids.clone())
            .push(")");
    }
    if let Some(event) = q.event {
        qb.push(" AND p.event_id = ").push_bind(event);
    }
    for (column, value) in [
        (" AND p.starttime >= ", q.starttime_gte),
        (" AND p.starttime <= ", q.starttime_lte),
        (" AND p.endtime >= ", q.endtime_gte),
        (" AND p.endtime <= ", q.endtime_lte),
    ] {
        if let Some(value) = value {
            qb.push(column).push_bind(value);
        }
    }
    if let Some(gte) = q.level_gte {
        qb.push(" AND p.level >= ").push_bind(gte);
    }
    if let Some(lte) = q.level_lte {
        qb.push(" AND p.level <= ").push_bind(lte);
    }
}

/// Individual probe disconnections, independent of event grouping.
pub async fn probes(
    conn: &Connection,
    q: &DiscoProbesQuery,
    window: PageWindow,
) -> Result<Page<DiscoProbeRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM disco_probes p");
    push_probe_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT p.probe_id, p.starttime, p.endtime, p.level, p.ipv4, p.prefixv4, \
         p.lat, p.lon, p.event_id FROM disco_probes p",
    );
    push_probe_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), PROBES_ORDERABLE),
        "p",
        "starttime",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows.iter().map(probe_row).collect(),
        total,
    })
}
