pub mod config;
pub mod error;
pub mod state;
pub mod content;
pub mod funnel;
pub mod lead;
pub mod routes;
pub mod views;
pub mod rate_limit;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::content::ContentClient;
use crate::lead::{FunnelKind, HttpLeadTransport, KeyValueStore, LeadChannel, LeadChannels};
use crate::rate_limit::LeadRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(
    config: Config,
    store: Arc<dyn KeyValueStore>,
) -> Result<(Router, SharedState), reqwest::Error> {
    let consultation = LeadChannel::new(
        FunnelKind::Consultation,
        Arc::new(HttpLeadTransport::new(
            config.leads.consultation_endpoint.clone(),
            config.leads.timeout,
        )?),
        store.clone(),
        config.leads.retry,
    );
    let ebook = LeadChannel::new(
        FunnelKind::Ebook,
        Arc::new(HttpLeadTransport::new(
            config.leads.ebook_endpoint.clone(),
            config.leads.timeout,
        )?),
        store,
        config.leads.retry,
    );

    let content = ContentClient::new(&config.content_api_url, config.content_timeout)?;
    let max_body_size = config.max_body_size;

    tracing::info!(
        consultation = %config.leads.consultation_endpoint,
        ebook = %config.leads.ebook_endpoint,
        "Lead endpoints configured"
    );

    let state: SharedState = Arc::new(AppState {
        config,
        content,
        leads: LeadChannels::new(consultation, ebook),
        lead_limiter: LeadRateLimiter::new(),
    });

    // Security headers
    let headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(routes::sitemap_routes())
        .merge(views::view_routes())
        .nest_service("/static", ServeDir::new("static"))
        .route("/health", axum::routing::get(health))
        .fallback(views::pages::not_found)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(headers)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    Ok((app, state))
}

async fn health() -> &'static str {
    "ok"
}
