use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A network known to the platform: an AS, or an IXP with a negative id to
/// avoid colliding with the ASN space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRow {
    pub number: i64,
    pub name: String,
    /// Covered by the AS dependency (hegemony) analysis.
    pub hegemony: bool,
    /// Covered by the link delay and forwarding anomaly analysis.
    pub delay_forwarding: bool,
    /// Covered by the network disconnection analysis.
    pub disco: bool,
}

/// Filters for `/networks`.
#[derive(Debug, Clone, Default)]
pub struct NetworksQuery {
    /// Substring match on the registered name, case-insensitive.
    pub name: Option<String>,
    pub numbers: Option<Vec<i64>>,
    pub number_gte: Option<i64>,
    pub number_lte: Option<i64>,
    /// Matches either the number (as text) or a name substring; an `AS` or
    /// `IX` prefix on a numeric value is stripped before matching.
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRow {
    pub code: String,
    pub name: String,
}

/// Filters for `/countries`.
#[derive(Debug, Clone, Default)]
pub struct CountriesQuery {
    pub code: Option<String>,
    pub name: Option<String>,
    pub ordering: Option<String>,
}

/// Inclusive timebin bounds, validated at the HTTP boundary. Endpoints that
/// require a time window always carry both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub gte: DateTime<Utc>,
    pub lte: DateTime<Utc>,
}

/// Time filter for endpoints that fall back to the latest available timebin
/// when no time parameter is given. An exact `timebin` is applied alongside
/// any bounds, matching the collaborator store's filter semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpenTimeRange {
    pub exact: Option<DateTime<Utc>>,
    pub gte: Option<DateTime<Utc>>,
    pub lte: Option<DateTime<Utc>>,
}

impl OpenTimeRange {
    /// True when no time filter was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.exact.is_none() && self.gte.is_none() && self.lte.is_none()
    }
}
