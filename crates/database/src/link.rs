use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

use np_types::link::{
    DelayAlarmRow, DelayAlarmsQuery, ForwardingAlarmRow, ForwardingAlarmsQuery,
    LinkMagnitudeQuery, LinkMagnitudeRow,
};
use np_types::wire::Page;

use crate::filter::{parse_ordering, push_page_clause, PageWindow};
use crate::init::Connection;

const MAGNITUDE_ORDERABLE: &[&str] = &["timebin", "asn", "magnitude"];
const DELAY_ALARMS_ORDERABLE: &[&str] = &[
    "timebin",
    "asn",
    "link",
    "medianrtt",
    "diffmedian",
    "deviation",
    "nbprobes",
];
const FORWARDING_ALARMS_ORDERABLE: &[&str] = &[
    "timebin",
    "asn",
    "ip",
    "correlation",
    "responsibility",
    "pktdiff",
];

/// The two magnitude tables share one shape; only the table differs.
#[derive(Debug, Clone, Copy)]
enum MagnitudeTable {
    Delay,
    Forwarding,
}

impl MagnitudeTable {
    fn from_clause(self) -> &'static str {
        match self {
            MagnitudeTable::Delay => " FROM delay d LEFT JOIN asn a ON a.number = d.asn",
            MagnitudeTable::Forwarding => {
                " FROM forwarding d LEFT JOIN asn a ON a.number = d.asn"
            }
        }
    }
}

fn push_magnitude_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &LinkMagnitudeQuery) {
    qb.push(" WHERE d.timebin >= ").push_bind(q.timebin.gte);
    qb.push(" AND d.timebin <= ").push_bind(q.timebin.lte);
    if let Some(asns) = &q.asns {
        qb.push(" AND d.asn = ANY(").push_bind(asns.clone()).push(")");
    }
    if let Some(magnitude) = q.magnitude {
        qb.push(" AND d.magnitude = ").push_bind(magnitude);
    }
}

async fn magnitudes(
    conn: &Connection,
    table: MagnitudeTable,
    q: &LinkMagnitudeQuery,
    window: PageWindow,
) -> Result<Page<LinkMagnitudeRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(table.from_clause());
    push_magnitude_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT d.timebin, d.asn, d.magnitude, COALESCE(a.name, '') AS asn_name",
    );
    qb.push(table.from_clause());
    push_magnitude_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), MAGNITUDE_ORDERABLE),
        "d",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| LinkMagnitudeRow {
                timebin: r.get("timebin"),
                asn: r.get("asn"),
                magnitude: r.get("magnitude"),
                asn_name: r.get("asn_name"),
            })
            .collect(),
        total,
    })
}

/// Cumulated link delay deviation per monitored network.
pub async fn delays(
    conn: &Connection,
    q: &LinkMagnitudeQuery,
    window: PageWindow,
) -> Result<Page<LinkMagnitudeRow>> {
    magnitudes(conn, MagnitudeTable::Delay, q, window).await
}

/// Cumulated forwarding anomaly magnitude per monitored network.
pub async fn forwardings(
    conn: &Connection,
    q: &LinkMagnitudeQuery,
    window: PageWindow,
) -> Result<Page<LinkMagnitudeRow>> {
    magnitudes(conn, MagnitudeTable::Forwarding, q, window).await
}

const DELAY_ALARMS_FROM: &str =
    " FROM delay_alarms d LEFT JOIN asn a ON a.number = d.asn";

fn push_delay_alarm_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &DelayAlarmsQuery) {
    qb.push(" WHERE d.timebin >= ").push_bind(q.timebin.gte);
    qb.push(" AND d.timebin <= ").push_bind(q.timebin.lte);
    if let Some(asns) = &q.asns {
        qb.push(" AND d.asn = ANY(").push_bind(asns.clone()).push(")");
    }
    for (column, value) in [
        (" AND d.deviation >= ", q.deviation_gte),
        (" AND d.deviation <= ", q.deviation_lte),
        (" AND d.diffmedian >= ", q.diffmedian_gte),
        (" AND d.diffmedian <= ", q.diffmedian_lte),
        (" AND d.medianrtt >= ", q.medianrtt_gte),
        (" AND d.medianrtt <= ", q.medianrtt_lte),
    ] {
        if let Some(value) = value {
            qb.push(column).push_bind(value);
        }
    }
    if let Some(gte) = q.nbprobes_gte {
        qb.push(" AND d.nbprobes >= ").push_bind(gte);
    }
    if let Some(lte) = q.nbprobes_lte {
        qb.push(" AND d.nbprobes <= ").push_bind(lte);
    }
    if let Some(link) = &q.link {
        qb.push(" AND d.link = ").push_bind(link.clone());
    }
    if let Some(fragment) = &q.link_contains {
        qb.push(" AND d.link LIKE ").push_bind(format!("%{}%", fragment));
    }
}

fn delay_alarm_row(r: &PgRow) -> DelayAlarmRow {
    DelayAlarmRow {
        timebin: r.get("timebin"),
        asn: r.get("asn"),
        asn_name: r.get("asn_name"),
        link: r.get("link"),
        medianrtt: r.get("medianrtt"),
        diffmedian: r.get("diffmedian"),
        deviation: r.get("deviation"),
        nbprobes: r.get("nbprobes"),
        msm_prb_ids: r.get("msm_prb_ids"),
    }
}

/// Individual congested links behind the delay magnitudes.
pub async fn delay_alarms(
    conn: &Connection,
    q: &DelayAlarmsQuery,
    window: PageWindow,
) -> Result<Page<DelayAlarmRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(DELAY_ALARMS_FROM);
    push_delay_alarm_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT d.timebin, d.asn, d.link, d.medianrtt, d.diffmedian, d.deviation, \
         d.nbprobes, d.msm_prb_ids, COALESCE(a.name, '') AS asn_name",
    );
    qb.push(DELAY_ALARMS_FROM);
    push_delay_alarm_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), DELAY_ALARMS_ORDERABLE),
        "d",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows.iter().map(delay_alarm_row).collect(),
        total,
    })
}

const FORWARDING_ALARMS_FROM: &str =
    " FROM forwarding_alarms d LEFT JOIN asn a ON a.number = d.asn";

fn push_forwarding_alarm_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &ForwardingAlarmsQuery) {
    qb.push(" WHERE d.timebin >= ").push_bind(q.timebin.gte);
    qb.push(" AND d.timebin <= ").push_bind(q.timebin.lte);
    if let Some(asns) = &q.asns {
        qb.push(" AND d.asn = ANY(").push_bind(asns.clone()).push(")");
    }
    for (column, value) in [
        (" AND d.correlation >= ", q.correlation_gte),
        (" AND d.correlation <= ", q.correlation_lte),
        (" AND d.responsibility >= ", q.responsibility_gte),
        (" AND d.responsibility <= ", q.responsibility_lte),
        (" AND d.pktdiff >= ", q.pktdiff_gte),
        (" AND d.pktdiff <= ", q.pktdiff_lte),
    ] {
        if let Some(value) = value {
            qb.push(column).push_bind(value);
        }
    }
    if let Some(previoushop) = &q.previoushop {
        qb.push(" AND d.previoushop = ").push_bind(previoushop.clone());
    }
}

/// Anomalous forwarding patterns behind the forwarding magnitudes.
pub async fn forwarding_alarms(
    conn: &Connection,
    q: &ForwardingAlarmsQuery,
    window: PageWindow,
) -> Result<Page<ForwardingAlarmRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(FORWARDING_ALARMS_FROM);
    push_forwarding_alarm_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT d.timebin, d.asn, d.ip, d.previoushop, d.correlation, d.responsibility, \
         d.pktdiff, d.msm_prb_ids, COALESCE(a.name, '') AS asn_name",
    );
    qb.push(FORWARDING_ALARMS_FROM);
    push_forwarding_alarm_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), FORWARDING_ALARMS_ORDERABLE),
        "d",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| ForwardingAlarmRow {
                timebin: r.get("timebin"),
                asn: r.get("asn"),
                asn_name: r.get("asn_name"),
                ip: r.get("ip"),
                previoushop: r.get("previoushop"),
                correlation: r.get("correlation"),
                responsibility: r.get("responsibility"),
                pktdiff: r.get("pktdiff"),
                msm_prb_ids: r.get("msm_prb_ids"),
            })
            .collect(),
        total,
    })
}
