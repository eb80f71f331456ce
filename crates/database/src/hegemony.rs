use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

use np_types::hegemony::{
    HegemonyAlarmRow, HegemonyAlarmsQuery, HegemonyConeRow, HegemonyConesQuery,
    HegemonyCountriesQuery, HegemonyCountryRow, HegemonyPrefixRow, HegemonyPrefixesQuery,
    HegemonyQuery, HegemonyRow,
};
use np_types::wire::Page;

use crate::filter::{parse_ordering, push_page_clause, PageWindow};
use crate::init::Connection;

const SCORES_ORDERABLE: &[&str] = &["timebin", "asn", "originasn", "hege", "af"];
const CONES_ORDERABLE: &[&str] = &["timebin", "asn", "conesize", "af"];
const ALARMS_ORDERABLE: &[&str] = &["timebin", "asn", "originasn", "deviation", "af"];
const COUNTRIES_ORDERABLE: &[&str] = &["timebin", "asn", "country", "hege", "af", "weight"];
const PREFIXES_ORDERABLE: &[&str] = &[
    "timebin",
    "prefix",
    "asn",
    "originasn",
    "country",
    "hege",
    "af",
    "visibility",
];

const SCORES_FROM: &str = " FROM hegemony h \
     LEFT JOIN asn a ON a.number = h.asn \
     LEFT JOIN asn o ON o.number = h.originasn";

fn push_score_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &HegemonyQuery) {
    qb.push(" WHERE h.timebin >= ").push_bind(q.timebin.gte);
    qb.push(" AND h.timebin <= ").push_bind(q.timebin.lte);
    if let Some(asns) = &q.asns {
        qb.push(" AND h.asn = ANY(").push_bind(asns.clone()).push(")");
    }
    if let Some(originasns) = &q.originasns {
        qb.push(" AND h.originasn = ANY(")
            .push_bind(originasns.clone())
            .push(")");
    }
    if let Some(af) = q.af {
        qb.push(" AND h.af = ").push_bind(af);
    }
    if let Some(hege) = q.hege {
        qb.push(" AND h.hege = ").push_bind(hege);
    }
    if let Some(gte) = q.hege_gte {
        qb.push(" AND h.hege >= ").push_bind(gte);
    }
    if let Some(lte) = q.hege_lte {
        qb.push(" AND h.hege <= ").push_bind(lte);
    }
}

fn score_row(r: &PgRow) -> HegemonyRow {
    HegemonyRow {
        timebin: r.get("timebin"),
        originasn: r.get("originasn"),
        asn: r.get("asn"),
        hege: r.get("hege"),
        af: r.get("af"),
        asn_name: r.get("asn_name"),
        originasn_name: r.get("originasn_name"),
    }
}

/// AS dependency scores, joined to both network names.
pub async fn scores(
    conn: &Connection,
    q: &HegemonyQuery,
    window: PageWindow,
) -> Result<Page<HegemonyRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(SCORES_FROM);
    push_score_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT h.timebin, h.originasn, h.asn, h.hege, h.af, \
         COALESCE(a.name, '') AS asn_name, COALESCE(o.name, '') AS originasn_name",
    );
    qb.push(SCORES_FROM);
    push_score_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), SCORES_ORDERABLE),
        "h",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows.iter().map(score_row).collect(),
        total,
    })
}

fn push_cone_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &HegemonyConesQuery) {
    qb.push(" WHERE h.timebin >= ").push_bind(q.timebin.gte);
    qb.push(" AND h.timebin <= ").push_bind(q.timebin.lte);
    if let Some(asns) = &q.asns {
        qb.push(" AND h.asn = ANY(").push_bind(asns.clone()).push(")");
    }
    if let Some(af) = q.af {
        qb.push(" AND h.af = ").push_bind(af);
    }
}

/// Dependent-network counts (cone sizes).
pub async fn cones(
    conn: &Connection,
    q: &HegemonyConesQuery,
    window: PageWindow,
) -> Result<Page<HegemonyConeRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM hegemony_cone h");
    push_cone_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb =
        QueryBuilder::new("SELECT h.timebin, h.asn, h.conesize, h.af FROM hegemony_cone h");
    push_cone_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), CONES_ORDERABLE),
        "h",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| HegemonyConeRow {
                timebin: r.get("timebin"),
                asn: r.get("asn"),
                conesize: r.get("conesize"),
                af: r.get("af"),
            })
            .collect(),
        total,
    })
}

const ALARMS_FROM: &str = " FROM hegemony_alarms h \
     LEFT JOIN asn a ON a.number = h.asn \
     LEFT JOIN asn o ON o.number = h.originasn";

fn push_alarm_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &HegemonyAlarmsQuery) {
    qb.push(" WHERE h.timebin >= ").push_bind(q.timebin.gte);
    qb.push(" AND h.timebin <= ").push_bind(q.timebin.lte);
    if let Some(asns) = &q.asns {
        qb.push(" AND h.asn = ANY(").push_bind(asns.clone()).push(")");
    }
    if let Some(originasns) = &q.originasns {
        qb.push(" AND h.originasn = ANY(")
            .push_bind(originasns.clone())
            .push(")");
    }
    if let Some(af) = q.af {
        qb.push(" AND h.af = ").push_bind(af);
    }
    if let Some(gte) = q.deviation_gte {
        qb.push(" AND h.deviation >= ").push_bind(gte);
    }
    if let Some(lte) = q.deviation_lte {
        qb.push(" AND h.deviation <= ").push_bind(lte);
    }
}

/// Dependency changes flagged by the anomaly detector.
pub async fn alarms(
    conn: &Connection,
    q: &HegemonyAlarmsQuery,
    window: PageWindow,
) -> Result<Page<HegemonyAlarmRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(ALARMS_FROM);
    push_alarm_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT h.timebin, h.originasn, h.asn, h.deviation, h.af, \
         COALESCE(a.name, '') AS asn_name, COALESCE(o.name, '') AS originasn_name",
    );
    qb.push(ALARMS_FROM);
    push_alarm_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), ALARMS_ORDERABLE),
        "h",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| HegemonyAlarmRow {
                timebin: r.get("timebin"),
                originasn: r.get("originasn"),
                asn: r.get("asn"),
                deviation: r.get("deviation"),
                af: r.get("af"),
                asn_name: r.get("asn_name"),
                originasn_name: r.get("originasn_name"),
            })
            .collect(),
        total,
    })
}

const COUNTRIES_FROM: &str =
    " FROM hegemony_country h LEFT JOIN asn a ON a.number = h.asn";

fn push_country_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &HegemonyCountriesQuery) {
    qb.push(" WHERE h.timebin >= ").push_bind(q.timebin.gte);
    qb.push(" AND h.timebin <= ").push_bind(q.timebin.lte);
    if let Some(asns) = &q.asns {
        qb.push(" AND h.asn = ANY(").push_bind(asns.clone()).push(")");
    }
    if let Some(countries) = &q.countries {
        qb.push(" AND h.country = ANY(")
            .push_bind(countries.clone())
            .push(")");
    }
    if let Some(af) = q.af {
        qb.push(" AND h.af = ").push_bind(af);
    }
    if let Some(scheme) = &q.weightscheme {
        qb.push(" AND h.weightscheme = ").push_bind(scheme.clone());
    }
    if let Some(transitonly) = q.transitonly {
        qb.push(" AND h.transitonly = ").push_bind(transitonly);
    }
    if let Some(hege) = q.hege {
        qb.push(" AND h.hege = ").push_bind(hege);
    }
    if let Some(gte) = q.hege_gte {
        qb.push(" AND h.hege >= ").push_bind(gte);
    }
    if let Some(lte) = q.hege_lte {
        qb.push(" AND h.hege <= ").push_bind(lte);
    }
}

/// Country-level dependencies.
pub async fn countries(
    conn: &Connection,
    q: &HegemonyCountriesQuery,
    window: PageWindow,
) -> Result<Page<HegemonyCountryRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(COUNTRIES_FROM);
    push_country_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT h.timebin, h.country, h.asn, h.hege, h.af, h.weight, h.weightscheme, \
         h.transitonly, COALESCE(a.name, '') AS asn_name",
    );
    qb.push(COUNTRIES_FROM);
    push_country_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), COUNTRIES_ORDERABLE),
        "h",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| HegemonyCountryRow {
                timebin: r.get("timebin"),
                country: r.get("country"),
                asn: r.get("asn"),
                hege: r.get("hege"),
                af: r.get("af"),
                asn_name: r.get("asn_name"),
                weight: r.get("weight"),
                weightscheme: r.get("weightscheme"),
                transitonly: r.get("transitonly"),
            })
            .collect(),
        total,
    })
}

const PREFIXES_FROM: &str = " FROM hegemony_prefix h \
     LEFT JOIN asn a ON a.number = h.asn \
     LEFT JOIN asn o ON o.number = h.originasn";

fn push_prefix_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &HegemonyPrefixesQuery) {
    qb.push(" WHERE h.timebin >= ").push_bind(q.timebin.gte);
    qb.push(" AND h.timebin <= ").push_bind(q.timebin.lte);
    if let Some(prefixes) = &q.prefixes {
        qb.push(" AND h.prefix = ANY(")
            .push_bind(prefixes.clone())
            .push(")");
    }
    if let Some(asns) = &q.asns {
        qb.push(" AND h.asn = ANY(").push_bind(asns.clone()).push(")");
    }
    if let Some(originasns) = &q.originasns {
        qb.push(" AND h.originasn = ANY(")
            .push_bind(originasns.clone())
            .push(")");
    }
    if let Some(countries) = &q.countries {
        qb.push(" AND h.country = ANY(")
            .push_bind(countries.clone())
            .push(")");
    }
    for (column, value) in [
        (" AND h.rpki_status LIKE ", &q.rpki_status),
        (" AND h.irr_status LIKE ", &q.irr_status),
        (" AND h.delegated_prefix_status LIKE ", &q.delegated_prefix_status),
        (" AND h.delegated_asn_status LIKE ", &q.delegated_asn_status),
    ] {
        if let Some(value) = value {
            qb.push(column).push_bind(format!("%{}%", value));
        }
    }
    if let Some(af) = q.af {
        qb.push(" AND h.af = ").push_bind(af);
    }
    if let Some(hege) = q.hege {
        qb.push(" AND h.hege = ").push_bind(hege);
    }
    if let Some(gte) = q.hege_gte {
        qb.push(" AND h.hege >= ").push_bind(gte);
    }
    if let Some(lte) = q.hege_lte {
        qb.push(" AND h.hege <= ").push_bind(lte);
    }
    if q.origin_only {
        qb.push(" AND h.originasn = h.asn");
    }
}

/// Prefix-level dependencies with route-origin validation context.
pub async fn prefixes(
    conn: &Connection,
    q: &HegemonyPrefixesQuery,
    window: PageWindow,
) -> Result<Page<HegemonyPrefixRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(PREFIXES_FROM);
    push_prefix_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT h.timebin, h.prefix, h.originasn, h.country, h.asn, h.hege, h.af, \
         h.visibility, h.rpki_status, h.irr_status, h.delegated_prefix_status, \
         h.delegated_asn_status, h.descr, h.moas, \
         COALESCE(o.name, '') AS originasn_name, COALESCE(a.name, '') AS asn_name",
    );
    qb.push(PREFIXES_FROM);
    push_prefix_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), PREFIXES_ORDERABLE),
        "h",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| HegemonyPrefixRow {
                timebin: r.get("timebin"),
                prefix: r.get("prefix"),
                originasn: r.get("originasn"),
                country: r.get("country"),
                asn: r.get("asn"),
                hege: r.get("hege"),
                af: r.get("af"),
                visibility: r.get("visibility"),
                rpki_status: r.get("rpki_status"),
                irr_status: r.get("irr_status"),
                delegated_prefix_status: r.get("delegated_prefix_status"),
                delegated_asn_status: r.get("delegated_asn_status"),
                descr: r.get("descr"),
                moas: r.get("moas"),
                originasn_name: r.get("originasn_name"),
                asn_name: r.get("asn_name"),
            })
            .collect(),
        total,
    })
}
