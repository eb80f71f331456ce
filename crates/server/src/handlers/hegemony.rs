use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use np_database::filter::PageWindow;
use np_types::hegemony::{
    HegemonyAlarmRow, HegemonyAlarmsQuery, HegemonyConeRow, HegemonyConesQuery,
    HegemonyCountriesQuery, HegemonyCountryRow, HegemonyPrefixRow, HegemonyPrefixesQuery,
    HegemonyQuery, HegemonyRow,
};
use np_types::wire::Paginated;

use crate::error::ApiError;
use crate::pagination;
use crate::params;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoresParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    asn: Option<String>,
    originasn: Option<String>,
    af: Option<i32>,
    hege: Option<f64>,
    #[serde(rename = "hege__gte")]
    hege_gte: Option<f64>,
    #[serde(rename = "hege__lte")]
    hege_lte: Option<f64>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// AS dependencies for all ASes visible in monitored BGP data. The global
/// graph is served with `originasn=0`.
pub async fn scores(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<ScoresParams>,
) -> Result<Json<Paginated<HegemonyRow>>, ApiError> {
    let timebin = params::required_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        7,
    )?;
    let asns = params::csv_list(p.asn.as_deref(), "asn")?;
    let originasns = params::csv_list(p.originasn.as_deref(), "originasn")?;
    if asns.is_none() && originasns.is_none() {
        return Err(ApiError::BadRequest(
            "Required parameter missing. Please provide one of the following parameters: \
             ['originasn', 'asn']"
                .to_string(),
        ));
    }

    let query = HegemonyQuery {
        timebin,
        asns,
        originasns,
        af: p.af,
        hege: p.hege,
        hege_gte: p.hege_gte,
        hege_lte: p.hege_lte,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data =
        np_database::hegemony::scores(&state.db, &query, PageWindow::new(page, state.page_size))
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
pub struct ConesParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    asn: Option<String>,
    af: Option<i32>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// Number of networks depending on each AS, akin to a customer cone size.
pub async fn cones(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<ConesParams>,
) -> Result<Json<Paginated<HegemonyConeRow>>, ApiError> {
    let timebin = params::required_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        7,
    )?;
    let query = HegemonyConesQuery {
        timebin,
        asns: params::csv_list(p.asn.as_deref(), "asn")?,
        af: p.af,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data =
        np_database::hegemony::cones(&state.db, &query, PageWindow::new(page, state.page_size))
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
    asn: Option<String>,
    originasn: Option<String>,
    af: Option<i32>,
    #[serde(rename = "deviation__gte")]
    deviation_gte: Option<f64>,
    #[serde(rename = "deviation__lte")]
    deviation_lte: Option<f64>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// Significant AS dependency changes flagged by the anomaly detector.
pub async fn alarms(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<AlarmsParams>,
) -> Result<Json<Paginated<HegemonyAlarmRow>>, ApiError> {
    let timebin = params::required_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        7,
    )?;
    let query = HegemonyAlarmsQuery {
        timebin,
        asns: params::csv_list(p.asn.as_deref(), "asn")?,
        originasns: params::csv_list(p.originasn.as_deref(), "originasn")?,
        af: p.af,
        deviation_gte: p.deviation_gte,
        deviation_lte: p.deviation_lte,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data =
        np_database::hegemony::alarms(&state.db, &query, PageWindow::new(page, state.page_size))
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
pub struct CountriesParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    asn: Option<String>,
    country: Option<String>,
    af: Option<i32>,
    weightscheme: Option<String>,
    transitonly: Option<bool>,
    hege: Option<f64>,
    #[serde(rename = "hege__gte")]
    hege_gte: Option<f64>,
    #[serde(rename = "hege__lte")]
    hege_lte: Option<f64>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// AS dependencies of countries, as defined by their registered AS sets.
pub async fn countries(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<CountriesParams>,
) -> Result<Json<Paginated<HegemonyCountryRow>>, ApiError> {
    let timebin = params::required_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        31,
    )?;
    if p.asn.is_none() && p.country.is_none() {
        return Err(ApiError::BadRequest(
            "Required parameter missing. Please provide one of the following parameters: \
             ['country', 'asn']"
                .to_string(),
        ));
    }
    let query = HegemonyCountriesQuery {
        timebin,
        asns: params::csv_list(p.asn.as_deref(), "asn")?,
        countries: params::csv_strings(p.country.as_deref()),
        af: p.af,
        weightscheme: p.weightscheme,
        transitonly: p.transitonly,
        hege: p.hege,
        hege_gte: p.hege_gte,
        hege_lte: p.hege_lte,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::hegemony::countries(
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
pub struct PrefixesParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    prefix: Option<String>,
    asn: Option<String>,
    originasn: Option<String>,
    country: Option<String>,
    rpki_status: Option<String>,
    irr_status: Option<String>,
    delegated_prefix_status: Option<String>,
    delegated_asn_status: Option<String>,
    af: Option<i32>,
    hege: Option<f64>,
    #[serde(rename = "hege__gte")]
    hege_gte: Option<f64>,
    #[serde(rename = "hege__lte")]
    hege_lte: Option<f64>,
    origin_only: Option<bool>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// AS dependencies of monitored prefixes.
pub async fn prefixes(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<PrefixesParams>,
) -> Result<Json<Paginated<HegemonyPrefixRow>>, ApiError> {
    if p.prefix.is_none()
        && p.originasn.is_none()
        && p.country.is_none()
        && p.rpki_status.is_none()
        && p.irr_status.is_none()
        && p.delegated_prefix_status.is_none()
        && p.delegated_asn_status.is_none()
    {
        return Err(ApiError::BadRequest(
            "Required parameter missing. Please provide one of the following parameters: \
             ['prefix', 'originasn', 'country', 'rpki_status', 'irr_status', \
             'delegated_prefix_status', 'delegated_asn_status']"
                .to_string(),
        ));
    }
    let timebin = params::required_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        3,
    )?;
    let query = HegemonyPrefixesQuery {
        timebin,
        prefixes: params::csv_strings(p.prefix.as_deref()),
        asns: params::csv_list(p.asn.as_deref(), "asn")?,
        originasns: params::csv_list(p.originasn.as_deref(), "originasn")?,
        countries: params::csv_strings(p.country.as_deref()),
        rpki_status: p.rpki_status,
        irr_status: p.irr_status,
        delegated_prefix_status: p.delegated_prefix_status,
        delegated_asn_status: p.delegated_asn_status,
        af: p.af,
        hege: p.hege,
        hege_gte: p.hege_gte,
        hege_lte: p.hege_lte,
        origin_only: p.origin_only.unwrap_or(false),
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data =
        np_database::hegemony::prefixes(&state.db, &query, PageWindow::new(page, state.page_size))
            .await?;
    Ok(Json(pagination::envelope(
        &uri,
        &headers,
        page,
        state.page_size,
        data,
    )))
}
