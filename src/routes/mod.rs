pub mod leads;
pub mod sitemap;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/leads/{funnel}", post(leads::submit))
        .route("/api/v1/leads/{funnel}/drain", post(leads::drain))
}

pub fn sitemap_routes() -> Router<SharedState> {
    Router::new()
        .route("/sitemap.xml", get(sitemap::sitemap))
        .route("/sitemap-services.xml", get(sitemap::services_sitemap))
}
