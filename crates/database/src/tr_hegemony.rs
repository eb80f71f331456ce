use anyhow::Result;
use sqlx::{Postgres, QueryBuilder, Row};

use np_types::traceroute::{TrHegemonyQuery, TrHegemonyRow};
use np_types::wire::Page;

use crate::filter::{parse_ordering, push_open_time_filter, push_page_clause, PageWindow};
use crate::init::Connection;

const ORDERABLE: &[&str] = &["timebin", "hege", "af", "nbsamples"];

/// `o` is the origin identifier, `dep` the dependency identifier.
const FROM: &str = " FROM tr_hegemony t \
     JOIN tr_hegemony_identifier o ON o.id = t.origin_id \
     JOIN tr_hegemony_identifier dep ON dep.id = t.dependency_id";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &TrHegemonyQuery) {
    qb.push(" WHERE TRUE");
    push_open_time_filter(qb, "t", "tr_hegemony", &q.timebin);
    if let Some(names) = &q.origin_names {
        qb.push(" AND o.name = ANY(").push_bind(names.clone()).push(")");
    }
    if let Some(kind) = &q.origin_type {
        qb.push(" AND o.type = ").push_bind(kind.clone());
    }
    if let Some(af) = q.origin_af {
        qb.push(" AND o.af = ").push_bind(af);
    }
    if let Some(names) = &q.dependency_names {
        qb.push(" AND dep.name = ANY(").push_bind(names.clone()).push(")");
    }
    if let Some(kind) = &q.dependency_type {
        qb.push(" AND dep.type = ").push_bind(kind.clone());
    }
    if let Some(af) = q.dependency_af {
        qb.push(" AND dep.af = ").push_bind(af);
    }
    if let Some(hege) = q.hege {
        qb.push(" AND t.hege = ").push_bind(hege);
    }
    if let Some(gte) = q.hege_gte {
        qb.push(" AND t.hege >= ").push_bind(gte);
    }
    if let Some(lte) = q.hege_lte {
        qb.push(" AND t.hege <= ").push_bind(lte);
    }
    if let Some(af) = q.af {
        qb.push(" AND t.af = ").push_bind(af);
    }
}

/// AS/IXP dependencies from traceroute data. Without a time filter the
/// latest timebin is served.
pub async fn dependencies(
    conn: &Connection,
    q: &TrHegemonyQuery,
    window: PageWindow,
) -> Result<Page<TrHegemonyRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*)");
    count.push(FROM);
    push_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT t.timebin, t.hege, t.af, t.nbsamples, \
         o.type AS origin_type, o.name AS origin_name, o.af AS origin_af, \
         dep.type AS dependency_type, dep.name AS dependency_name, dep.af AS dependency_af",
    );
    qb.push(FROM);
    push_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), ORDERABLE),
        "t",
        "timebin",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| TrHegemonyRow {
                timebin: r.get("timebin"),
                origin_type: r.get("origin_type"),
                origin_name: r.get("origin_name"),
                origin_af: r.get("origin_af"),
                dependency_type: r.get("dependency_type"),
                dependency_name: r.get("dependency_name"),
                dependency_af: r.get("dependency_af"),
                hege: r.get("hege"),
                af: r.get("af"),
                nbsamples: r.get("nbsamples"),
            })
            .collect(),
        total,
    })
}
