use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use np_database::filter::PageWindow;
use np_types::disco::{DiscoEventRow, DiscoEventsQuery, DiscoProbeRow, DiscoProbesQuery};
use np_types::wire::Paginated;

use crate::error::ApiError;
use crate::pagination;
use crate::params;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    streamname: Option<String>,
    streamtype: Option<String>,
    starttime: Option<String>,
    #[serde(rename = "starttime__gte")]
    starttime_gte: Option<String>,
    #[serde(rename = "starttime__lte")]
    starttime_lte: Option<String>,
    endtime: Option<String>,
    #[serde(rename = "endtime__gte")]
    endtime_gte: Option<String>,
    #[serde(rename = "endtime__lte")]
    endtime_lte: Option<String>,
    avglevel: Option<f64>,
    #[serde(rename = "avglevel__gte")]
    avglevel_gte: Option<f64>,
    #[serde(rename = "avglevel__lte")]
    avglevel_lte: Option<f64>,
    nbdiscoprobes: Option<i32>,
    #[serde(rename = "nbdiscoprobes__gte")]
    nbdiscoprobes_gte: Option<i32>,
    #[serde(rename = "nbdiscoprobes__lte")]
    nbdiscoprobes_lte: Option<i32>,
    totalprobes: Option<i32>,
    #[serde(rename = "totalprobes__gte")]
    totalprobes_gte: Option<i32>,
    #[serde(rename = "totalprobes__lte")]
    totalprobes_lte: Option<i32>,
    /// Deprecated upstream; accepted and ignored.
    #[allow(dead_code)]
    ongoing: Option<String>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// Network disconnections detected with RIPE Atlas, at AS, country, or
/// regional granularity.
pub async fn events(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<EventsParams>,
) -> Result<Json<Paginated<DiscoEventRow>>, ApiError> {
    let query = DiscoEventsQuery {
        streamname: p.streamname,
        streamtype: p.streamtype,
        starttime: params::opt_timestamp(p.starttime.as_deref(), "starttime")?,
        starttime_gte: params::opt_timestamp(p.starttime_gte.as_deref(), "starttime__gte")?,
        starttime_lte: params::opt_timestamp(p.starttime_lte.as_deref(), "starttime__lte")?,
        endtime: params::opt_timestamp(p.endtime.as_deref(), "endtime")?,
        endtime_gte: params::opt_timestamp(p.endtime_gte.as_deref(), "endtime__gte")?,
        endtime_lte: params::opt_timestamp(p.endtime_lte.as_deref(), "endtime__lte")?,
        avglevel: p.avglevel,
        avglevel_gte: p.avglevel_gte,
        avglevel_lte: p.avglevel_lte,
        nbdiscoprobes: p.nbdiscoprobes,
        nbdiscoprobes_gte: p.nbdiscoprobes_gte,
        nbdiscoprobes_lte: p.nbdiscoprobes_lte,
        totalprobes: p.totalprobes,
        totalprobes_gte: p.totalprobes_gte,
        totalprobes_lte: p.totalprobes_lte,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data =
        np_database::disco::events(&state.db, &query, PageWindow::new(page, state.page_size))
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
pub struct ProbesParams {
    probe_id: Option<String>,
    event: Option<i64>,
    #[serde(rename = "starttime__gte")]
    starttime_gte: Option<String>,
    #[serde(rename = "starttime__lte")]
    starttime_lte: Option<String>,
    #[serde(rename = "endtime__gte")]
    endtime_gte: Option<String>,
    #[serde(rename = "endtime__lte")]
    endtime_lte: Option<String>,
    #[serde(rename = "level__gte")]
    level_gte: Option<f64>,
    #[serde(rename = "level__lte")]
    level_lte: Option<f64>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// Individual probe disconnections.
pub async fn probes(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<ProbesParams>,
) -> Result<Json<Paginated<DiscoProbeRow>>, ApiError> {
    let query = DiscoProbesQuery {
        probe_ids: params::csv_list(p.probe_id.as_deref(), "probe_id")?,
        event: p.event,
        starttime_gte: params::opt_timestamp(p.starttime_gte.as_deref(), "starttime__gte")?,
        starttime_lte: params::opt_timestamp(p.starttime_lte.as_deref(), "starttime__lte")?,
        endtime_gte: params::opt_timestamp(p.endtime_gte.as_deref(), "endtime__gte")?,
        endtime_lte: params::opt_timestamp(p.endtime_lte.as_deref(), "endtime__lte")?,
        level_gte: p.level_gte,
        level_lte: p.level_lte,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data =
        np_database::disco::probes(&state.db, &query, PageWindow::new(page, state.page_size))
            .await?;
    Ok(Json(pagination::envelope(
        &uri,
        &headers,
        page,
        state.page_size,
        data,
    )))
}
