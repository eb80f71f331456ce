use np_types::network::OpenTimeRange;
use sqlx::{Postgres, QueryBuilder};

/// Page number and size, already clamped at the HTTP boundary.
#[derive(Debug, Clone, Copy)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
}

impl PageWindow {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// A validated ordering: a column from the endpoint's whitelist plus the
/// direction. A leading `-` on the wire value flips to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub column: &'static str,
    pub descending: bool,
}

/// Match a raw `ordering` parameter against the endpoint's orderable
/// columns. Unknown columns are ignored, like any other unmatched filter
/// value.
pub fn parse_ordering(raw: Option<&str>, allowed: &[&'static str]) -> Option<Ordering> {
    let raw = raw?.trim();
    let (name, descending) = match raw.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    allowed
        .iter()
        .copied()
        .find(|col| *col == name)
        .map(|column| Ordering { column, descending })
}

/// Append `ORDER BY ... OFFSET ... LIMIT ...` to a page query. `prefix` is
/// the FROM-clause alias of the ordered table; `default_order` keeps page
/// slicing deterministic when the caller did not ask for an ordering.
pub fn push_page_clause(
    qb: &mut QueryBuilder<'_, Postgres>,
    ordering: Option<Ordering>,
    prefix: &str,
    default_order: &str,
    window: PageWindow,
) {
    match ordering {
        Some(ord) => {
            qb.push(format!(
                " ORDER BY {}.{}{}",
                prefix,
                ord.column,
                if ord.descending { " DESC" } else { "" }
            ));
        }
        None => {
            qb.push(format!(" ORDER BY {}.{}", prefix, default_order));
        }
    }
    qb.push(format!(" OFFSET {} LIMIT {}", window.offset(), window.limit()));
}

/// Append the time predicates of an endpoint that falls back to the latest
/// available timebin. With no time filter at all, the page is pinned to
/// `MAX(timebin)` of `table`; otherwise every supplied bound applies.
pub fn push_open_time_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    alias: &str,
    table: &str,
    t: &OpenTimeRange,
) {
    if t.is_empty() {
        qb.push(format!(
            " AND {}.timebin = (SELECT MAX(timebin) FROM {})",
            alias, table
        ));
        return;
    }
    if let Some(exact) = t.exact {
        qb.push(format!(" AND {}.timebin = ", alias)).push_bind(exact);
    }
    if let Some(gte) = t.gte {
        qb.push(format!(" AND {}.timebin >= ", alias)).push_bind(gte);
    }
    if let Some(lte) = t.lte {
        qb.push(format!(" AND {}.timebin <= ", alias)).push_bind(lte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["timebin", "asn", "hege"];

    #[test]
    fn window_arithmetic() {
        let w = PageWindow::new(1, 100);
        assert_eq!(w.offset(), 0);
        assert_eq!(w.limit(), 100);
        let w = PageWindow::new(3, 25);
        assert_eq!(w.offset(), 50);
        assert_eq!(w.limit(), 25);
    }

    #[test]
    fn page_zero_clamps_to_one() {
        assert_eq!(PageWindow::new(0, 10).offset(), 0);
    }

    #[test]
    fn ordering_whitelist() {
        let ord = parse_ordering(Some("hege"), ALLOWED).unwrap();
        assert_eq!(ord.column, "hege");
        assert!(!ord.descending);

        let ord = parse_ordering(Some("-timebin"), ALLOWED).unwrap();
        assert_eq!(ord.column, "timebin");
        assert!(ord.descending);

        assert_eq!(parse_ordering(Some("nope"), ALLOWED), None);
        assert_eq!(parse_ordering(Some("timebin; DROP TABLE asn"), ALLOWED), None);
        assert_eq!(parse_ordering(None, ALLOWED), None);
    }

    #[test]
    fn page_clause_defaults_to_natural_order() {
        let mut qb = QueryBuilder::new("SELECT 1");
        push_page_clause(&mut qb, None, "h", "timebin", PageWindow::new(2, 50));
        assert_eq!(qb.sql(), "SELECT 1 ORDER BY h.timebin OFFSET 50 LIMIT 50");
    }

    #[test]
    fn page_clause_with_descending_ordering() {
        let mut qb = QueryBuilder::new("SELECT 1");
        let ord = parse_ordering(Some("-hege"), ALLOWED);
        push_page_clause(&mut qb, ord, "h", "timebin", PageWindow::new(1, 10));
        assert_eq!(qb.sql(), "SELECT 1 ORDER BY h.hege DESC OFFSET 0 LIMIT 10");
    }

    #[test]
    fn empty_time_filter_pins_to_latest_timebin() {
        let mut qb = QueryBuilder::new("SELECT 1 WHERE TRUE");
        push_open_time_filter(&mut qb, "d", "atlas_delay", &OpenTimeRange::default());
        assert_eq!(
            qb.sql(),
            "SELECT 1 WHERE TRUE AND d.timebin = (SELECT MAX(timebin) FROM atlas_delay)"
        );
    }
}
