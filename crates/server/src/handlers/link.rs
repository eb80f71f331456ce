use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use np_database::filter::PageWindow;
use np_types::link::{
    DelayAlarmRow, DelayAlarmsQuery, ForwardingAlarmRow, ForwardingAlarmsQuery,
    LinkMagnitudeQuery, LinkMagnitudeRow,
};
use np_types::wire::Paginated;

use crate::error::ApiError;
use crate::pagination;
use crate::params;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MagnitudeParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    asn: Option<String>,
    magnitude: Option<f64>,
    page: Option<u32>,
    ordering: Option<String>,
}

impl MagnitudeParams {
    fn into_query(self) -> Result<(LinkMagnitudeQuery, u32), ApiError> {
        let timebin = params::required_timebin(
            self.timebin.as_deref(),
            self.timebin_gte.as_deref(),
            self.timebin_lte.as_deref(),
            7,
        )?;
        let page = self.page.unwrap_or(1).max(1);
        Ok((
            LinkMagnitudeQuery {
                timebin,
                asns: params::csv_list(self.asn.as_deref(), "asn")?,
                magnitude: self.magnitude,
                ordering: self.ordering,
            },
            page,
        ))
    }
}

/// Cumulated link delay deviation per monitored network.
pub async fn delay(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<MagnitudeParams>,
) -> Result<Json<Paginated<LinkMagnitudeRow>>, ApiError> {
    let (query, page) = p.into_query()?;
    let data =
        np_database::link::delays(&state.db, &query, PageWindow::new(page, state.page_size))
            .await?;
    Ok(Json(pagination::envelope(
        &uri,
        &headers,
        page,
        state.page_size,
        data,
    )))
}

/// Cumulated forwarding anomaly magnitude per monitored network.
pub async fn forwarding(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<MagnitudeParams>,
) -> Result<Json<Paginated<LinkMagnitudeRow>>, ApiError> {
    let (query, page) = p.into_query()?;
    let data =
        np_database::link::forwardings(&state.db, &query, PageWindow::new(page, state.page_size))
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
pub struct DelayAlarmsParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    asn: Option<String>,
    #[serde(rename = "deviation__gte")]
    deviation_gte: Option<f64>,
    #[serde(rename = "deviation__lte")]
    deviation_lte: Option<f64>,
    #[serde(rename = "diffmedian__gte")]
    diffmedian_gte: Option<f64>,
    #[serde(rename = "diffmedian__lte")]
    diffmedian_lte: Option<f64>,
    #[serde(rename = "medianrtt__gte")]
    medianrtt_gte: Option<f64>,
    #[serde(rename = "medianrtt__lte")]
    medianrtt_lte: Option<f64>,
    #[serde(rename = "nbprobes__gte")]
    nbprobes_gte: Option<i32>,
    #[serde(rename = "nbprobes__lte")]
    nbprobes_lte: Option<i32>,
    link: Option<String>,
    #[serde(rename = "link__contains")]
    link_contains: Option<String>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// Individual congested links behind the delay magnitudes.
pub async fn delay_alarms(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<DelayAlarmsParams>,
) -> Result<Json<Paginated<DelayAlarmRow>>, ApiError> {
    let timebin = params::required_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        7,
    )?;
    let query = DelayAlarmsQuery {
        timebin,
        asns: params::csv_list(p.asn.as_deref(), "asn")?,
        deviation_gte: p.deviation_gte,
        deviation_lte: p.deviation_lte,
        diffmedian_gte: p.diffmedian_gte,
        diffmedian_lte: p.diffmedian_lte,
        medianrtt_gte: p.medianrtt_gte,
        medianrtt_lte: p.medianrtt_lte,
        nbprobes_gte: p.nbprobes_gte,
        nbprobes_lte: p.nbprobes_lte,
        link: p.link,
        link_contains: p.link_contains,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data =
        np_database::link::delay_alarms(&state.db, &query, PageWindow::new(page, state.page_size))
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
pub struct ForwardingAlarmsParams {
    timebin: Option<String>,
    #[serde(rename = "timebin__gte")]
    timebin_gte: Option<String>,
    #[serde(rename = "timebin__lte")]
    timebin_lte: Option<String>,
    asn: Option<String>,
    #[serde(rename = "correlation__gte")]
    correlation_gte: Option<f64>,
    #[serde(rename = "correlation__lte")]
    correlation_lte: Option<f64>,
    #[serde(rename = "responsibility__gte")]
    responsibility_gte: Option<f64>,
    #[serde(rename = "responsibility__lte")]
    responsibility_lte: Option<f64>,
    #[serde(rename = "pktdiff__gte")]
    pktdiff_gte: Option<f64>,
    #[serde(rename = "pktdiff__lte")]
    pktdiff_lte: Option<f64>,
    previoushop: Option<String>,
    page: Option<u32>,
    ordering: Option<String>,
}

/// Anomalous forwarding patterns behind the forwarding magnitudes.
pub async fn forwarding_alarms(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(p): Query<ForwardingAlarmsParams>,
) -> Result<Json<Paginated<ForwardingAlarmRow>>, ApiError> {
    let timebin = params::required_timebin(
        p.timebin.as_deref(),
        p.timebin_gte.as_deref(),
        p.timebin_lte.as_deref(),
        7,
    )?;
    let query = ForwardingAlarmsQuery {
        timebin,
        asns: params::csv_list(p.asn.as_deref(), "asn")?,
        correlation_gte: p.correlation_gte,
        correlation_lte: p.correlation_lte,
        responsibility_gte: p.responsibility_gte,
        responsibility_lte: p.responsibility_lte,
        pktdiff_gte: p.pktdiff_gte,
        pktdiff_lte: p.pktdiff_lte,
        previoushop: p.previoushop,
        ordering: p.ordering,
    };
    let page = p.page.unwrap_or(1).max(1);
    let data = np_database::link::forwarding_alarms(
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
