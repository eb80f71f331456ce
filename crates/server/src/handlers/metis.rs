use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use np_database::filter::PageWindow;
use np_types::metis::{MetisQuery, MetisRankingRow, MetisTable};
use np_types::wire::Paginated;

use crate::error::ApiError;
use crate::pagination;
use crate::params;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetisParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    rank: Option<i32>,
    #[serde(rename = "rank__gte")]
    rank_gte: Option<i32>,
    #[serde(rename = "rank__lte")]
    rank_lte: Option<i32>,
    metric: Option<String>,
    af: Option<i32>,
    page: Option<u32>,
    ordering: Option<String>,
}

async fn ranking(
    state: AppState,
    uri: axum::http::Uri,
    headers: HeaderMap,
    p: MetisParams,
    table: MetisTable,
) -> Result<Json<Paginated<MetisRankingRow>>, ApiError> {
    let timebin = params::open_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        31,
    )?;
    let query = MetisQuery {
        timebin,
        rank: p.rank,
        rank_gte: p.rank_gte,
        rank_lte: p.rank_lte,
        metric: p.metric,
        af: p.af,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::metis::ranking(
        &state.db,
        table,
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

/// ASes that would most improve Atlas coverage if probes were deployed in
/// them; serves the latest ranking when no time filter is given.
pub async fn deployment(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<MetisParams>,
) -> Result<Json<Paginated<MetisRankingRow>>, ApiError> {
    ranking(state, uri, headers, p, MetisTable::Deployment).await
}

/// Most topologically diverse probe ASes for measurement source selection.
pub async fn selection(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<MetisParams>,
) -> Result<Json<Paginated<MetisRankingRow>>, ApiError> {
    ranking(state, uri, headers, p, MetisTable::Selection).await
}
