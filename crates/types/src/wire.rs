use serde::{Deserialize, Serialize};

/// One page of rows plus the total row count of the filtered set, as
/// returned by every `np-database` query function.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
        }
    }
}

/// Envelope returned by every list endpoint.
///
/// `next`/`previous` carry the request URL with only the `page` parameter
/// replaced, or null at either end of the result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_nulls_at_the_ends() {
        let body = Paginated {
            count: 1,
            next: None,
            previous: None,
            results: vec![42u32],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"count": 1, "next": null, "previous": null, "results": [42]})
        );
    }
}
