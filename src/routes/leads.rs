use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::funnel::steps;
use crate::funnel::{HONEYPOT_FIELD, metadata, validation};
use crate::lead::{DrainReport, FunnelKind, LeadFields, attribution};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    #[serde(default)]
    pub fields: LeadFields,
    /// Query string of the page the visitor filled the form on.
    #[serde(default)]
    pub page_query: String,
    /// Document referrer of that page. Falls back to the Referer header.
    #[serde(default)]
    pub referrer: Option<String>,
}

pub async fn submit(
    State(state): State<SharedState>,
    Path(funnel): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let funnel = parse_funnel(&funnel)?;

    let request: LeadRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

    check_rate_limit(&state, funnel, &headers, addr)?;

    let mut fields = request.fields;
    if validation::is_spam(fields.get(HONEYPOT_FIELD)) {
        tracing::debug!(%funnel, "Honeypot filled, dropping lead");
        return Ok((StatusCode::OK, Json(json!({ "status": "ok" }))).into_response());
    }
    fields.remove(HONEYPOT_FIELD);

    let specs = steps::fields_for(funnel);
    validation::coerce_consent(&mut fields, &specs);
    validation::validate_fields(&fields, &specs)?;

    let attribution =
        attribution::from_headers(&request.page_query, request.referrer.as_deref(), &headers);

    let outcome = state.leads.get(funnel).submit(fields, attribution).await;
    let status = if outcome.is_delivered() {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };

    Ok((status, Json(outcome)).into_response())
}

pub async fn drain(
    State(state): State<SharedState>,
    Path(funnel): Path<String>,
) -> Result<Json<DrainReport>, AppError> {
    let funnel = parse_funnel(&funnel)?;
    let report = state
        .leads
        .get(funnel)
        .drain()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to drain {funnel} queue: {e}")))?;
    Ok(Json(report))
}

fn parse_funnel(raw: &str) -> Result<FunnelKind, AppError> {
    FunnelKind::parse(raw).ok_or_else(|| AppError::NotFound(format!("Unknown funnel: {raw}")))
}

/// Per-IP limit on lead submissions, shared by the JSON API and the HTML
/// forms.
pub fn check_rate_limit(
    state: &SharedState,
    funnel: FunnelKind,
    headers: &HeaderMap,
    peer: SocketAddr,
) -> Result<(), AppError> {
    let ip = metadata::client_ip(headers, Some(peer.ip()), &state.config.trusted_proxies);
    state
        .lead_limiter
        .check(
            funnel,
            ip,
            state.config.rate_limit,
            state.config.rate_limit_window_secs,
        )
        .map_err(|retry_after| {
            AppError::RateLimited(format!("Rate limited. Retry after {retry_after}s"))
        })
}
