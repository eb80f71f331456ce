//! Query-parameter parsing shared by the handlers: delimited lists,
//! timestamps in the formats clients actually send, and the timebin-range
//! rules with their per-endpoint span ceilings.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use np_types::atlas::LocationKey;
use np_types::network::{OpenTimeRange, TimeRange};

use crate::error::ApiError;

const NO_TIMEBIN: &str = "No timebin parameter. Please provide a timebin value or a range of \
     values with timebin__lte and timebin__gte.";
const HALF_OPEN_RANGE: &str =
    "Invalid timebin range. Please provide both timebin__lte and timebin__gte.";

/// Accepts RFC 3339 as well as the naive `YYYY-MM-DD[THH:MM:SS]` forms;
/// naive values are taken as UTC.
pub fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(ApiError::BadRequest(format!(
        "Invalid timestamp for parameter '{}': '{}'.",
        field, raw
    )))
}

pub fn opt_timestamp(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    raw.map(|value| parse_timestamp(value, field)).transpose()
}

/// Comma-delimited list of parseable values, e.g. `2497,2500,2501`.
pub fn csv_list<T: FromStr>(raw: Option<&str>, field: &str) -> Result<Option<Vec<T>>, ApiError> {
    let Some(raw) = raw else { return Ok(None) };
    let mut values = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        values.push(part.parse::<T>().map_err(|_| {
            ApiError::BadRequest(format!("Invalid value '{}' for parameter '{}'.", part, field))
        })?);
    }
    Ok(if values.is_empty() { None } else { Some(values) })
}

/// Comma-delimited list of strings (country codes, prefixes).
pub fn csv_strings(raw: Option<&str>) -> Option<Vec<String>> {
    split_strings(raw, ',')
}

/// Pipe-delimited list of identifier names.
pub fn pipe_strings(raw: Option<&str>) -> Option<Vec<String>> {
    split_strings(raw, '|')
}

fn split_strings(raw: Option<&str>, delimiter: char) -> Option<Vec<String>> {
    let values: Vec<String> = raw?
        .split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Pipe-delimited composite location keys; unusable fragments are dropped.
pub fn location_keys(raw: Option<&str>) -> Option<Vec<LocationKey>> {
    let keys: Vec<LocationKey> = raw?.split('|').filter_map(LocationKey::parse).collect();
    if keys.is_empty() {
        None
    } else {
        Some(keys)
    }
}

fn span_too_large(max_days: i64) -> ApiError {
    ApiError::BadRequest(format!(
        "The given timebin range is too large. Should be less than {} days.",
        max_days
    ))
}

/// Timebin rules for endpoints that require a time window: an exact timebin
/// or a closed range, no wider than `max_days`. An exact timebin overrides
/// the range parameters.
pub fn required_timebin(
    timebin: Option<&str>,
    gte: Option<&str>,
    lte: Option<&str>,
    max_days: i64,
) -> Result<TimeRange, ApiError> {
    let timebin = opt_timestamp(timebin, "timebin")?;
    let gte = opt_timestamp(gte, "timebin__gte")?;
    let lte = opt_timestamp(lte, "timebin__lte")?;

    let (gte, lte) = match (timebin, gte, lte) {
        (None, None, None) => return Err(ApiError::BadRequest(NO_TIMEBIN.to_string())),
        (Some(exact), _, _) => (exact, exact),
        (None, Some(gte), Some(lte)) => (gte, lte),
        (None, _, _) => return Err(ApiError::BadRequest(HALF_OPEN_RANGE.to_string())),
    };

    if lte - gte > Duration::days(max_days) {
        return Err(span_too_large(max_days));
    }
    Ok(TimeRange { gte, lte })
}

/// Timebin rules for endpoints that fall back to the latest timebin: all
/// parameters optional, but a closed range still honors the span ceiling.
pub fn open_timebin(
    timebin: Option<&str>,
    gte: Option<&str>,
    lte: Option<&str>,
    max_days: i64,
) -> Result<OpenTimeRange, ApiError> {
    let range = OpenTimeRange {
        exact: opt_timestamp(timebin, "timebin")?,
        gte: opt_timestamp(gte, "timebin__gte")?,
        lte: opt_timestamp(lte, "timebin__lte")?,
    };
    if let (Some(gte), Some(lte)) = (range.gte, range.lte) {
        if lte - gte > Duration::days(max_days) {
            return Err(span_too_large(max_days));
        }
    }
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(detail) => detail,
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn timestamps_in_client_formats() {
        for raw in [
            "2023-06-05T00:00:00Z",
            "2023-06-05T00:00:00+00:00",
            "2023-06-05T00:00:00",
            "2023-06-05 00:00:00",
            "2023-06-05",
        ] {
            let ts = parse_timestamp(raw, "timebin").unwrap();
            assert_eq!(ts.to_rfc3339(), "2023-06-05T00:00:00+00:00", "{}", raw);
        }
        assert!(parse_timestamp("yesterday", "timebin").is_err());
    }

    #[test]
    fn csv_parses_and_rejects() {
        let values: Vec<i64> = csv_list(Some("2497, 2500,2501"), "asn").unwrap().unwrap();
        assert_eq!(values, vec![2497, 2500, 2501]);
        assert!(csv_list::<i64>(None, "asn").unwrap().is_none());
        assert!(csv_list::<i64>(Some("2497,abc"), "asn").is_err());
        assert!(csv_list::<i64>(Some(" , "), "asn").unwrap().is_none());
    }

    #[test]
    fn pipe_lists() {
        assert_eq!(
            pipe_strings(Some("2497|195.66.224.1")),
            Some(vec!["2497".to_string(), "195.66.224.1".to_string()])
        );
        assert!(pipe_strings(Some("")).is_none());
    }

    #[test]
    fn required_timebin_missing_entirely() {
        let err = required_timebin(None, None, None, 7).unwrap_err();
        assert!(detail(err).starts_with("No timebin parameter."));
    }

    #[test]
    fn required_timebin_half_open() {
        let err = required_timebin(None, Some("2023-06-05"), None, 7).unwrap_err();
        assert!(detail(err).starts_with("Invalid timebin range."));
        let err = required_timebin(None, None, Some("2023-06-05"), 7).unwrap_err();
        assert!(detail(err).starts_with("Invalid timebin range."));
    }

    #[test]
    fn required_timebin_exact_overrides_range() {
        let range =
            required_timebin(Some("2023-06-05"), Some("2023-01-01"), Some("2023-12-31"), 7)
                .unwrap();
        assert_eq!(range.gte, range.lte);
    }

    #[test]
    fn required_timebin_span_ceiling() {
        let err =
            required_timebin(None, Some("2023-06-01"), Some("2023-06-09"), 7).unwrap_err();
        assert!(detail(err).contains("less than 7 days"));
        // Exactly at the ceiling passes.
        assert!(required_timebin(None, Some("2023-06-01"), Some("2023-06-08"), 7).is_ok());
    }

    #[test]
    fn open_timebin_allows_absence_but_keeps_ceiling() {
        let range = open_timebin(None, None, None, 31).unwrap();
        assert!(range.is_empty());
        let err = open_timebin(None, Some("2023-01-01"), Some("2023-03-01"), 31).unwrap_err();
        assert!(detail(err).contains("less than 31 days"));
    }
}
