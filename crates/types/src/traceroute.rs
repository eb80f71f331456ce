use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::OpenTimeRange;

/// AS/IXP dependency derived from traceroute data. Origin and dependency are
/// identifiers that may name an AS, an IXP, an IXP member, or a member IP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrHegemonyRow {
    pub timebin: DateTime<Utc>,
    pub origin_type: String,
    pub origin_name: String,
    pub origin_af: i32,
    pub dependency_type: String,
    pub dependency_name: String,
    pub dependency_af: i32,
    pub hege: f64,
    pub af: i32,
    pub nbsamples: i32,
}

#[derive(Debug, Clone, Default)]
pub struct TrHegemonyQuery {
    pub timebin: OpenTimeRange,
    /// Pipe-delimited on the wire; exact identifier names.
    pub origin_names: Option<Vec<String>>,
    pub dependency_names: Option<Vec<String>>,
    pub origin_type: Option<String>,
    pub dependency_type: Option<String>,
    pub origin_af: Option<i32>,
    pub dependency_af: Option<i32>,
    pub hege: Option<f64>,
    pub hege_gte: Option<f64>,
    pub hege_lte: Option<f64>,
    pub af: Option<i32>,
    pub ordering: Option<String>,
}
