use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::TimeRange;

/// AS dependency score of `originasn` on the transit network `asn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HegemonyRow {
    pub timebin: DateTime<Utc>,
    pub originasn: i64,
    pub asn: i64,
    pub hege: f64,
    pub af: i32,
    pub asn_name: String,
    pub originasn_name: String,
}

#[derive(Debug, Clone)]
pub struct HegemonyQuery {
    pub timebin: TimeRange,
    pub asns: Option<Vec<i64>>,
    pub originasns: Option<Vec<i64>>,
    pub af: Option<i32>,
    pub hege: Option<f64>,
    pub hege_gte: Option<f64>,
    pub hege_lte: Option<f64>,
    pub ordering: Option<String>,
}

/// Number of networks that depend on `asn`, akin to a customer cone size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HegemonyConeRow {
    pub timebin: DateTime<Utc>,
    pub asn: i64,
    pub conesize: i32,
    pub af: i32,
}

#[derive(Debug, Clone)]
pub struct HegemonyConesQuery {
    pub timebin: TimeRange,
    pub asns: Option<Vec<i64>>,
    pub af: Option<i32>,
    pub ordering: Option<String>,
}

/// Significant AS dependency change flagged by the anomaly detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HegemonyAlarmRow {
    pub timebin: DateTime<Utc>,
    pub originasn: i64,
    pub asn: i64,
    pub deviation: f64,
    pub af: i32,
    pub asn_name: String,
    pub originasn_name: String,
}

#[derive(Debug, Clone)]
pub struct HegemonyAlarmsQuery {
    pub timebin: TimeRange,
    pub asns: Option<Vec<i64>>,
    pub originasns: Option<Vec<i64>>,
    pub af: Option<i32>,
    pub deviation_gte: Option<f64>,
    pub deviation_lte: Option<f64>,
    pub ordering: Option<String>,
}

/// Dependency of a country's AS set on the transit network `asn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HegemonyCountryRow {
    pub timebin: DateTime<Utc>,
    pub country: String,
    pub asn: i64,
    pub hege: f64,
    pub af: i32,
    pub asn_name: String,
    pub weight: f64,
    pub weightscheme: String,
    pub transitonly: bool,
}

#[derive(Debug, Clone)]
pub struct HegemonyCountriesQuery {
    pub timebin: TimeRange,
    pub asns: Option<Vec<i64>>,
    pub countries: Option<Vec<String>>,
    pub af: Option<i32>,
    pub weightscheme: Option<String>,
    pub transitonly: Option<bool>,
    pub hege: Option<f64>,
    pub hege_gte: Option<f64>,
    pub hege_lte: Option<f64>,
    pub ordering: Option<String>,
}

/// Dependency of a monitored prefix, with route-origin validation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HegemonyPrefixRow {
    pub timebin: DateTime<Utc>,
    pub prefix: String,
    pub originasn: i64,
    pub country: String,
    pub asn: i64,
    pub hege: f64,
    pub af: i32,
    pub visibility: f64,
    pub rpki_status: String,
    pub irr_status: String,
    pub delegated_prefix_status: String,
    pub delegated_asn_status: String,
    pub descr: String,
    pub moas: bool,
    pub originasn_name: String,
    pub asn_name: String,
}

#[derive(Debug, Clone)]
pub struct HegemonyPrefixesQuery {
    pub timebin: TimeRange,
    pub prefixes: Option<Vec<String>>,
    pub asns: Option<Vec<i64>>,
    pub originasns: Option<Vec<i64>>,
    pub countries: Option<Vec<String>>,
    /// Substring matches, like the other three status filters.
    pub rpki_status: Option<String>,
    pub irr_status: Option<String>,
    pub delegated_prefix_status: Option<String>,
    pub delegated_asn_status: Option<String>,
    pub af: Option<i32>,
    pub hege: Option<f64>,
    pub hege_gte: Option<f64>,
    pub hege_lte: Option<f64>,
    /// Keep only rows where the dependency is the origin itself.
    pub origin_only: bool,
    pub ordering: Option<String>,
}
