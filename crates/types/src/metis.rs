use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::network::OpenTimeRange;

/// Which Metis ranking table a query runs against. The display value is the
/// table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MetisTable {
    #[strum(serialize = "metis_atlas_deployment")]
    Deployment,
    #[strum(serialize = "metis_atlas_selection")]
    Selection,
}

impl MetisTable {
    /// Only the deployment ranking records the probe-AS sample count.
    pub fn has_nbsamples(self) -> bool {
        matches!(self, MetisTable::Deployment)
    }
}

/// One entry of a Metis AS ranking: the `rank`-th most distant AS for the
/// given metric and address family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetisRankingRow {
    pub timebin: DateTime<Utc>,
    pub metric: String,
    pub rank: i32,
    pub asn: i64,
    pub af: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbsamples: Option<i32>,
    pub asn_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct MetisQuery {
    pub timebin: OpenTimeRange,
    pub rank: Option<i32>,
    pub rank_gte: Option<i32>,
    pub rank_lte: Option<i32>,
    /// One of `as_path_length`, `ip_hops`, `rtt`.
    pub metric: Option<String>,
    pub af: Option<i32>,
    pub ordering: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names() {
        assert_eq!(MetisTable::Deployment.to_string(), "metis_atlas_deployment");
        assert_eq!(MetisTable::Selection.to_string(), "metis_atlas_selection");
    }
}
