use anyhow::Result;
use sqlx::{Postgres, QueryBuilder, Row};

use np_types::metis::{MetisQuery, MetisRankingRow, MetisTable};
use np_types::wire::Page;

use crate::filter::{parse_ordering, push_open_time_filter, push_page_clause, PageWindow};
use crate::init::Connection;

const ORDERABLE: &[&str] = &["timebin", "metric", "rank", "asn", "af"];

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, table: MetisTable, q: &MetisQuery) {
    qb.push(" WHERE TRUE");
    push_open_time_filter(qb, "m", &table.to_string(), &q.timebin);
    if let Some(rank) = q.rank {
        qb.push(" AND m.rank = ").push_bind(rank);
    }
    if let Some(gte) = q.rank_gte {
        qb.push(" AND m.rank >= ").push_bind(gte);
    }
    if let Some(lte) = q.rank_lte {
        qb.push(" AND m.rank <= ").push_bind(lte);
    }
    if let Some(metric) = &q.metric {
        qb.push(" AND m.metric = ").push_bind(metric.clone());
    }
    if let Some(af) = q.af {
        qb.push(" AND m.af = ").push_bind(af);
    }
}

/// One Metis AS ranking (probe deployment candidates or probe selection),
/// joined to network names. Without a time filter the latest ranking is
/// served.
pub async fn ranking(
    conn: &Connection,
    table: MetisTable,
    q: &MetisQuery,
    window: PageWindow,
) -> Result<Page<MetisRankingRow>> {
    let from = format!(" FROM {} m LEFT JOIN asn a ON a.number = m.asn", table);

    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(from.clone());
    push_filters(&mut count, table, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(if table.has_nbsamples() {
        "SELECT m.timebin, m.metric, m.rank, m.asn, m.af, m.nbsamples, \
         COALESCE(a.name, '') AS asn_name"
    } else {
        "SELECT m.timebin, m.metric, m.rank, m.asn, m.af, \
         COALESCE(a.name, '') AS asn_name"
    });
    qb.push(from);
    push_filters(&mut qb, table, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), ORDERABLE),
        "m",
        "rank",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| MetisRankingRow {
                timebin: r.get("timebin"),
                metric: r.get("metric"),
                rank: r.get("rank"),
                asn: r.get("asn"),
                af: r.get("af"),
                nbsamples: if table.has_nbsamples() {
                    Some(r.get("nbsamples"))
                } else {
                    None
                },
                asn_name: r.get("asn_name"),
            })
            .collect(),
        total,
    })
}
