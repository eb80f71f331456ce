use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

use np_types::network::{CountriesQuery, CountryRow, NetworkRow, NetworksQuery};
use np_types::wire::Page;

use crate::filter::{parse_ordering, push_page_clause, PageWindow};
use crate::init::Connection;

const NETWORKS_ORDERABLE: &[&str] = &["number", "name"];
const COUNTRIES_ORDERABLE: &[&str] = &["code", "name"];

/// `AS2497` / `IX123` search terms match on their numeric part; anything
/// else is used verbatim.
fn strip_network_prefix(search: &str) -> &str {
    let upper = search.to_ascii_uppercase();
    if upper.starts_with("AS") || upper.starts_with("IX") {
        if let Some(rest) = search.get(2..) {
            if rest.parse::<i64>().is_ok() {
                return rest;
            }
        }
    }
    search
}

fn push_network_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &NetworksQuery) {
    qb.push(" WHERE TRUE");
    if let Some(name) = &q.name {
        qb.push(" AND a.name ILIKE ").push_bind(format!("%{}%", name));
    }
    if let Some(numbers) = &q.numbers {
        qb.push(" AND a.number = ANY(")
            .push_bind(numbers.clone())
            .push(")");
    }
    if let Some(gte) = q.number_gte {
        qb.push(" AND a.number >= ").push_bind(gte);
    }
    if let Some(lte) = q.number_lte {
        qb.push(" AND a.number <= ").push_bind(lte);
    }
    if let Some(search) = &q.search {
        let needle = strip_network_prefix(search);
        qb.push(" AND (CAST(a.number AS TEXT) LIKE ")
            .push_bind(format!("%{}%", needle))
            .push(" OR a.name ILIKE ")
            .push_bind(format!("%{}%", search))
            .push(")");
    }
}

fn network_row(r: &PgRow) -> NetworkRow {
    NetworkRow {
        number: r.get("number"),
        name: r.get("name"),
        hegemony: r.get("ashash"),
        delay_forwarding: r.get("tartiflette"),
        disco: r.get("disco"),
    }
}

/// Networks referenced by any analysis, searchable by name, number, or both.
pub async fn networks(
    conn: &Connection,
    q: &NetworksQuery,
    window: PageWindow,
) -> Result<Page<NetworkRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM asn a");
    push_network_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new(
        "SELECT a.number, a.name, a.ashash, a.tartiflette, a.disco FROM asn a",
    );
    push_network_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), NETWORKS_ORDERABLE),
        "a",
        "number",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows.iter().map(network_row).collect(),
        total,
    })
}

fn push_country_filters(qb: &mut QueryBuilder<'_, Postgres>, q: &CountriesQuery) {
    qb.push(" WHERE TRUE");
    if let Some(code) = &q.code {
        qb.push(" AND c.code = ").push_bind(code.clone());
    }
    if let Some(name) = &q.name {
        qb.push(" AND c.name ILIKE ").push_bind(format!("%{}%", name));
    }
}

/// Countries and regions monitored by the platform.
pub async fn countries(
    conn: &Connection,
    q: &CountriesQuery,
    window: PageWindow,
) -> Result<Page<CountryRow>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM country c");
    push_country_filters(&mut count, q);
    let total: i64 = count.build_query_scalar().fetch_one(conn).await?;

    let mut qb = QueryBuilder::new("SELECT c.code, c.name FROM country c");
    push_country_filters(&mut qb, q);
    push_page_clause(
        &mut qb,
        parse_ordering(q.ordering.as_deref(), COUNTRIES_ORDERABLE),
        "c",
        "code",
        window,
    );
    let rows = qb.build().fetch_all(conn).await?;
    Ok(Page {
        rows: rows
            .iter()
            .map(|r| CountryRow {
                code: r.get("code"),
                name: r.get("name"),
            })
            .collect(),
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_prefix_stripping() {
        assert_eq!(strip_network_prefix("AS2497"), "2497");
        assert_eq!(strip_network_prefix("ix123"), "123");
        assert_eq!(strip_network_prefix("ASIJ"), "ASIJ");
        assert_eq!(strip_network_prefix("IIJ"), "IIJ");
        assert_eq!(strip_network_prefix("A"), "A");
    }
}
