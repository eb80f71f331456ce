use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::TimeRange;

/// Cumulated delay (or forwarding) anomaly magnitude for one network and
/// timebin. Served by both `/link/delay` and `/link/forwarding`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkMagnitudeRow {
    pub timebin: DateTime<Utc>,
    pub asn: i64,
    pub magnitude: f64,
    pub asn_name: String,
}

#[derive(Debug, Clone)]
pub struct LinkMagnitudeQuery {
    pub timebin: TimeRange,
    pub asns: Option<Vec<i64>>,
    pub magnitude: Option<f64>,
    pub ordering: Option<String>,
}

/// Congested link reported by the delay anomaly detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayAlarmRow {
    pub timebin: DateTime<Utc>,
    pub asn: i64,
    pub asn_name: String,
    /// Pair of IP addresses identifying the link.
    pub link: String,
    pub medianrtt: f64,
    pub diffmedian: f64,
    pub deviation: f64,
    pub nbprobes: i32,
    pub msm_prb_ids: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct DelayAlarmsQuery {
    pub timebin: TimeRange,
    pub asns: Option<Vec<i64>>,
    pub deviation_gte: Option<f64>,
    pub deviation_lte: Option<f64>,
    pub diffmedian_gte: Option<f64>,
    pub diffmedian_lte: Option<f64>,
    pub medianrtt_gte: Option<f64>,
    pub medianrtt_lte: Option<f64>,
    pub nbprobes_gte: Option<i32>,
    pub nbprobes_lte: Option<i32>,
    pub link: Option<String>,
    pub link_contains: Option<String>,
    pub ordering: Option<String>,
}

/// Anomalous forwarding pattern reported for one IP hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardingAlarmRow {
    pub timebin: DateTime<Utc>,
    pub asn: i64,
    pub asn_name: String,
    pub ip: String,
    /// Last observed IP hop on the usual path.
    pub previoushop: String,
    pub correlation: f64,
    pub responsibility: f64,
    pub pktdiff: f64,
    pub msm_prb_ids: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ForwardingAlarmsQuery {
    pub timebin: TimeRange,
    pub asns: Option<Vec<i64>>,
    pub correlation_gte: Option<f64>,
    pub correlation_lte: Option<f64>,
    pub responsibility_gte: Option<f64>,
    pub responsibility_lte: Option<f64>,
    pub pktdiff_gte: Option<f64>,
    pub pktdiff_lte: Option<f64>,
    pub previoushop: Option<String>,
    pub ordering: Option<String>,
}
