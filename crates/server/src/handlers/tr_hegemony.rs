use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use np_database::filter::PageWindow;
use np_types::traceroute::{TrHegemonyQuery, TrHegemonyRow};
use np_types::wire::Paginated;

use crate::error::ApiError;
use crate::pagination;
use crate::params;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TrHegemonyParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    origin_name: Option<String>,
    dependency_name: Option<String>,
    origin_type: Option<String>,
    dependency_type: Option<String>,
    origin_af: Option<i32>,
    dependency_af: Option<i32>,
    hege: Option<f64>,
    #[serde(rename = "hege__gte")]
    hege_gte: Option<f64>,
    #[serde(rename = "hege__lte")]
    hege_lte: Option<f64>,
    af: Option<i32>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// AS and IXP dependencies from monitored traceroute data; serves the latest
/// timebin when no time filter is given.
pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<TrHegemonyParams>,
) -> Result<Json<Paginated<TrHegemonyRow>>, ApiError> {
    let timebin = params::open_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        31,
    )?;
    let query = TrHegemonyQuery {
        timebin,
        origin_names: params::pipe_strings(p.origin_name.as_deref()),
        dependency_names: params::pipe_strings(p.dependency_name.as_deref()),
        origin_type: p.origin_type,
        dependency_type: p.dependency_type,
        origin_af: p.origin_af,
        dependency_af: p.dependency_af,
        hege: p.hege,
        hege_gte: p.hege_gte,
        hege_lte: p.hege_lte,
        af: p.af,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::tr_hegemony::dependencies(
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
