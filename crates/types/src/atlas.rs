use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::OpenTimeRange;

/// A location monitored for network delay: an AS, a city, an Atlas probe, or
/// the whole IP space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub af: i32,
}

#[derive(Debug, Clone, Default)]
pub struct LocationsQuery {
    /// Substring match on the location identifier, case-insensitive.
    pub name: Option<String>,
    pub kind: Option<String>,
    pub af: Option<i32>,
    pub ordering: Option<String>,
}

/// Compact location selector of the form `<TYPE><AF><NAME>`, e.g. `AS42497`
/// for AS2497 over IPv4. Type is the first two characters, the address
/// family the third (when it is a digit), the identifier the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationKey {
    pub kind: String,
    pub af: Option<i32>,
    pub name: Option<String>,
}

impl LocationKey {
    /// Split a composite key into its parts. Keys shorter than two
    /// characters carry no usable condition and yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        let chars: Vec<char> = key.chars().collect();
        if chars.len() < 2 {
            return None;
        }
        let kind: String = chars[..2].iter().collect();
        let af = chars.get(2).and_then(|c| c.to_digit(10)).map(|d| d as i32);
        let name = if chars.len() > 3 {
            Some(chars[3..].iter().collect())
        } else {
            None
        };
        Some(Self { kind, af, name })
    }
}

/// Filters applying to one side (start or end point) of a delay measurement.
#[derive(Debug, Clone, Default)]
pub struct PointFilter {
    /// Pipe-delimited on the wire; exact name matches.
    pub names: Option<Vec<String>>,
    pub kind: Option<String>,
    pub af: Option<i32>,
    /// Composite keys, OR-ed together.
    pub keys: Option<Vec<LocationKey>>,
}

impl PointFilter {
    pub fn is_empty(&self) -> bool {
        self.names.is_none() && self.kind.is_none() && self.af.is_none() && self.keys.is_none()
    }
}

/// Median RTT estimate between two monitored locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDelayRow {
    pub timebin: DateTime<Utc>,
    pub startpoint_type: String,
    pub startpoint_name: String,
    pub startpoint_af: i32,
    pub endpoint_type: String,
    pub endpoint_name: String,
    pub endpoint_af: i32,
    pub median: f64,
    pub nbtracks: i32,
    pub nbprobes: i32,
    pub entropy: f64,
    pub hop: i32,
    pub nbrealrtts: i32,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkDelayQuery {
    pub timebin: OpenTimeRange,
    pub startpoint: PointFilter,
    pub endpoint: PointFilter,
    pub median: Option<f64>,
    pub median_gte: Option<f64>,
    pub median_lte: Option<f64>,
    pub ordering: Option<String>,
}

/// Anomalous delay change between two monitored locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDelayAlarmRow {
    pub timebin: DateTime<Utc>,
    pub startpoint_type: String,
    pub startpoint_name: String,
    pub startpoint_af: i32,
    pub endpoint_type: String,
    pub endpoint_name: String,
    pub endpoint_af: i32,
    pub deviation: f64,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkDelayAlarmsQuery {
    pub timebin: OpenTimeRange,
    pub startpoint: PointFilter,
    pub endpoint: PointFilter,
    pub deviation_gte: Option<f64>,
    pub deviation_lte: Option<f64>,
    pub ordering: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_key_full() {
        let key = LocationKey::parse("AS42497").unwrap();
        assert_eq!(key.kind, "AS");
        assert_eq!(key.af, Some(4));
        assert_eq!(key.name.as_deref(), Some("2497"));
    }

    #[test]
    fn composite_key_type_only() {
        let key = LocationKey::parse("CT").unwrap();
        assert_eq!(key.kind, "CT");
        assert_eq!(key.af, None);
        assert_eq!(key.name, None);
    }

    #[test]
    fn composite_key_non_digit_af() {
        // Third character is not an address family; the name is still taken
        // from the fourth character on.
        let key = LocationKey::parse("ASX2497").unwrap();
        assert_eq!(key.kind, "AS");
        assert_eq!(key.af, None);
        assert_eq!(key.name.as_deref(), Some("2497"));
    }

    #[test]
    fn composite_key_too_short() {
        assert!(LocationKey::parse("A").is_none());
        assert!(LocationKey::parse("").is_none());
    }
}
