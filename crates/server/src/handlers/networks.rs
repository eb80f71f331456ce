use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use np_database::filter::PageWindow;
use np_types::network::{NetworkRow, NetworksQuery};
use np_types::wire::Paginated;

use crate::error::ApiError;
use crate::pagination;
use crate::params;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NetworksParams {
    name: Option<String>,
    number: Option<String>,
    #[serde(rename = "number__gte")]
    number_gte: Option<i64>,
    #[serde(rename = "number__lte")]
    number_lte: Option<i64>,
    search: Option<String>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// List networks referenced by any analysis; searchable by keyword, ASN, or
/// IXP id.
pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<NetworksParams>,
) -> Result<Json<Paginated<NetworkRow>>, ApiError> {
    let query = NetworksQuery {
        name: p.name,
        numbers: params::csv_list(p.number.as_deref(), "number")?,
        number_gte: p.number_gte,
        number_lte: p.number_lte,
        search: p.search,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::networks::networks(
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
