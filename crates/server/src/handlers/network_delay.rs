use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use np_database::filter::PageWindow;
use np_types::atlas::{
    LocationRow, LocationsQuery, NetworkDelayAlarmRow, NetworkDelayAlarmsQuery, NetworkDelayQuery,
    NetworkDelayRow, PointFilter,
};
use np_types::wire::Paginated;

use crate::error::ApiError;
use crate::pagination;
use crate::params;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DelayParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    startpoint_name: Option<String>,
    endpoint_name: Option<String>,
    startpoint_type: Option<String>,
    endpoint_type: Option<String>,
    startpoint_af: Option<i32>,
    endpoint_af: Option<i32>,
    startpoint_key: Option<String>,
    endpoint_key: Option<String>,
    median: Option<f64>,
    #[serde(rename = "median__gte")]
    median_gte: Option<f64>,
    #[serde(rename = "median__lte")]
    median_lte: Option<f64>,
    page: Option<u32>,
    ordering: Option<String>,
}

fn point_filter(
    names: Option<String>,
    kind: Option<String>,
    af: Option<i32>,
    keys: Option<String>,
) -> PointFilter {
    PointFilter {
        names: params::pipe_strings(names.as_deref()),
        kind,
        af,
        keys: params::location_keys(keys.as_deref()),
    }
}

/// Median RTT estimates between monitored locations; serves the latest
/// timebin when no time filter is given.
pub async fn delays(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<DelayParams>,
) -> Result<Json<Paginated<NetworkDelayRow>>, ApiError> {
    let timebin = params::open_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        7,
    )?;
    let query = NetworkDelayQuery {
        timebin,
        startpoint: point_filter(
            p.startpoint_name,
            p.startpoint_type,
            p.startpoint_af,
            p.startpoint_key,
        ),
        endpoint: point_filter(p.endpoint_name, p.endpoint_type, p.endpoint_af, p.endpoint_key),
        median: p.median,
        median_gte: p.median_gte,
        median_lte: p.median_lte,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::network_delay::delays(
        &state.db,
        &query,
        PageWindow::new(page, state.page_size),
    )
    .await?;
    Ok(Json(pagination::envelope(
        &uri,
        &headers,
        page,
        state.page_size,
        data,
    )))
}

#[derive(Debug, Deserialize)]
pub struct LocationsParams {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    af: Option<i32>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// Locations monitored for network delay measurements.
pub async fn locations(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<LocationsParams>,
) -> Result<Json<Paginated<LocationRow>>, ApiError> {
    let query = LocationsQuery {
        name: p.name,
        kind: p.kind,
        af: p.af,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::network_delay::locations(
        &state.db,
        &query,
        PageWindow::new(page, state.page_size),
    )
    .await?;
    Ok(Json(pagination::envelope(
        &uri,
        &headers,
        page,
        state.page_size,
        data,
    )))
}

#[derive(Debug, Deserialize)]
pub struct AlarmsParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    startpoint_name: Option<String>,
    endpoint_name: Option<String>,
    startpoint_type: Option<String>,
    endpoint_type: Option<String>,
    startpoint_af: Option<i32>,
    endpoint_af: Option<i32>,
    startpoint_key: Option<String>,
    endpoint_key: Option<String>,
    #[serde(rename = "deviation__gte")]
    deviation_gte: Option<f64>,
    #[serde(rename = "deviation__lte")]
    deviation_lte: Option<f64>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// Anomalous delay changes between monitored locations.
pub async fn alarms(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<AlarmsParams>,
) -> Result<Json<Paginated<NetworkDelayAlarmRow>>, ApiError> {
    let timebin = params::open_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        7,
    )?;
    let query = NetworkDelayAlarmsQuery {
        timebin,
        startpoint: point_filter(
            p.startpoint_name,
            p.startpoint_type,
            p.startpoint_af,
            p.startpoint_key,
        ),
        endpoint: point_filter(p.endpoint_name, p.endpoint_type, p.endpoint_af, p.endpoint_key),
        deviation_gte: p.deviation_gte,
        deviation_lte: p.deviation_lte,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::network_delay::alarms(
        &state.db,
        &query,
        PageWindow::new(page, state.page_size),
    )
    .await?;
    Ok(Json(pagination::envelope(
        &uri,
        &headers,
        page,
        state.page_size,
        data,
    )))
}
