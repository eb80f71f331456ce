use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Network disconnection event, at AS, country, or sub-country granularity,
/// with the disconnected probes embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoEventRow {
    pub id: i64,
    pub streamtype: String,
    pub streamname: String,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub avglevel: f64,
    pub nbdiscoprobes: i32,
    pub totalprobes: i32,
    pub ongoing: bool,
    pub discoprobes: Vec<DiscoProbeRow>,
}

/// One probe disconnection inside an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoProbeRow {
    pub probe_id: i32,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub level: f64,
    pub ipv4: String,
    pub prefixv4: String,
    pub event: i64,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoEventsQuery {
    pub streamname: Option<String>,
    pub streamtype: Option<String>,
    pub starttime: Option<DateTime<Utc>>,
    pub starttime_gte: Option<DateTime<Utc>>,
    pub starttime_lte: Option<DateTime<Utc>>,
    pub endtime: Option<DateTime<Utc>>,
    pub endtime_gte: Option<DateTime<Utc>>,
    pub endtime_lte: Option<DateTime<Utc>>,
    pub avglevel: Option<f64>,
    pub avglevel_gte: Option<f64>,
    pub avglevel_lte: Option<f64>,
    pub nbdiscoprobes: Option<i32>,
    pub nbdiscoprobes_gte: Option<i32>,
    pub nbdiscoprobes_lte: Option<i32>,
    pub totalprobes: Option<i32>,
    pub totalprobes_gte: Option<i32>,
    pub totalprobes_lte: Option<i32>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoProbesQuery {
    pub probe_ids: Option<Vec<i32>>,
    pub event: Option<i64>,
    pub starttime_gte: Option<DateTime<Utc>>,
    pub starttime_lte: Option<DateTime<Utc>>,
    pub endtime_gte: Option<DateTime<Utc>>,
    pub endtime_lte: Option<DateTime<Utc>>,
    pub level_gte: Option<f64>,
    pub level_lte: Option<f64>,
    pub ordering: Option<String>,
}
