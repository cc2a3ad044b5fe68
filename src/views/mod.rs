pub mod articles;
pub mod forms;
pub mod funnels;
pub mod pages;

use askama::Template;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;

use crate::content::Navigation;
use crate::error::AppError;
use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/thanks", get(pages::thanks))
        // Content
        .route("/blogs", get(articles::blog_index))
        .route("/blogs/{slug}", get(articles::blog_show))
        .route("/products", get(articles::product_index))
        .route("/products/{slug}", get(articles::product_show))
        .route("/usecases", get(articles::usecase_index))
        .route("/usecases/{slug}", get(articles::usecase_show))
        // Funnels
        .route(
            "/consultation",
            get(funnels::consultation_page).post(funnels::consultation_submit),
        )
        .route("/ebook", get(funnels::ebook_page).post(funnels::ebook_submit))
        .route("/ebook/{variant}", get(funnels::ebook_variant_page))
}

/// Data every page shares through `base.html`.
pub struct Layout {
    pub title: String,
    pub description: String,
    pub nav: Navigation,
}

impl Layout {
    pub async fn load(state: &SharedState, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            nav: state.content.navigation().await,
        }
    }
}

pub fn render<T: Template>(status: StatusCode, template: &T) -> Result<Response, AppError> {
    Ok((status, Html(template.render()?)).into_response())
}
