use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use np_database::filter::PageWindow;
use np_types::network::{CountriesQuery, CountryRow};
use np_types::wire::Paginated;

use crate::error::ApiError;
use crate::pagination;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CountriesParams {
    code: Option<String>,
    name: Option<String>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// List monitored countries and regions.
pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<CountriesParams>,
) -> Result<Json<Paginated<CountryRow>>, ApiError> {
    let query = CountriesQuery {
        code: p.code,
        name: p.name,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::networks::countries(
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
