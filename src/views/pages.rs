use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;

use super::{Layout, render};
use crate::content::{Article, ContentKind};
use crate::error::AppError;
use crate::funnel::ebook_display_name;
use crate::state::SharedState;

const DEFAULT_HERO_TITLE: &str = "Grow your business with AI";
const DEFAULT_HERO_SUBTITLE: &str =
    "Practical automation, content and data projects for small and mid-sized companies.";

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    layout: Layout,
    hero_title: String,
    hero_subtitle: String,
    mission_title: String,
    mission_paragraph: String,
    cta_text: String,
    recent_blogs: Vec<Article>,
    products: Vec<Article>,
}

pub async fn home(State(state): State<SharedState>) -> Result<Response, AppError> {
    let (homepage, recent_blogs, products) = tokio::join!(
        state.content.homepage(),
        state.content.recent(ContentKind::Blog),
        state.content.list(ContentKind::Product),
    );
    let homepage = homepage.unwrap_or_default();

    let hero_title = non_empty(homepage.text("title_h"), DEFAULT_HERO_TITLE);
    let template = HomeTemplate {
        layout: Layout::load(&state, hero_title.clone(), homepage.text("solution_subtitle")).await,
        hero_title,
        hero_subtitle: non_empty(homepage.text("solution_subtitle"), DEFAULT_HERO_SUBTITLE),
        mission_title: homepage.text("mission_title_h"),
        mission_paragraph: homepage.text("mission_paragraph"),
        cta_text: non_empty(homepage.text("cta_consulenza"), "Book a free consultation"),
        recent_blogs,
        products: products.results,
    };
    render(StatusCode::OK, &template)
}

#[derive(Template)]
#[template(path = "about.html")]
struct AboutTemplate {
    layout: Layout,
    heading: String,
    subtitle: String,
    content: String,
}

pub async fn about(State(state): State<SharedState>) -> Result<Response, AppError> {
    let about = state.content.about().await.unwrap_or_default();
    let heading = non_empty(about.title.clone(), "About us");
    let title = non_empty(about.meta_title.clone(), &heading);
    let description = non_empty(about.meta_description.clone(), &about.description);

    let template = AboutTemplate {
        layout: Layout::load(&state, title, description).await,
        heading,
        subtitle: about.subtitle,
        content: about.content,
    };
    render(StatusCode::OK, &template)
}

#[derive(Deserialize)]
pub struct ThanksQuery {
    #[serde(default)]
    ebook: String,
}

#[derive(Template)]
#[template(path = "thanks.html")]
struct ThanksTemplate {
    layout: Layout,
    ebook_name: String,
}

pub async fn thanks(
    State(state): State<SharedState>,
    Query(query): Query<ThanksQuery>,
) -> Result<Response, AppError> {
    // Arrives either as a slug or as the display name the CRM echoes back
    let ebook_name = if query.ebook.contains('-') {
        ebook_display_name(&query.ebook)
    } else {
        query.ebook
    };

    let template = ThanksTemplate {
        layout: Layout::load(&state, "Thank you", "").await,
        ebook_name,
    };
    render(StatusCode::OK, &template)
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    layout: Layout,
}

pub async fn not_found(State(state): State<SharedState>) -> Result<Response, AppError> {
    not_found_page(&state).await
}

pub async fn not_found_page(state: &SharedState) -> Result<Response, AppError> {
    let template = NotFoundTemplate {
        layout: Layout::load(state, "Page not found", "").await,
    };
    render(StatusCode::NOT_FOUND, &template)
}

fn non_empty(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
