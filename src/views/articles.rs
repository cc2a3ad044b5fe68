use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use super::pages::not_found_page;
use super::{Layout, render};
use crate::content::{Article, ContentKind, Faq, Section};
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "article_index.html")]
struct IndexTemplate {
    layout: Layout,
    heading: &'static str,
    base_path: &'static str,
    articles: Vec<Article>,
    count: usize,
}

#[derive(Template)]
#[template(path = "article.html")]
struct ArticleTemplate {
    layout: Layout,
    article: Article,
    author: String,
    sections: Vec<Section>,
    faqs: Vec<Faq>,
    base_path: &'static str,
    section_label: &'static str,
}

async fn index(state: SharedState, kind: ContentKind) -> Result<Response, AppError> {
    let collection = state.content.list(kind).await;
    let template = IndexTemplate {
        layout: Layout::load(&state, kind.label(), "").await,
        heading: kind.label(),
        base_path: kind.site_path(),
        count: collection.count,
        articles: collection.results,
    };
    render(StatusCode::OK, &template)
}

async fn show(state: SharedState, kind: ContentKind, slug: &str) -> Result<Response, AppError> {
    let Some(article) = state.content.get(kind, slug).await else {
        tracing::debug!("No {} found for slug '{slug}'", kind.api_path());
        return not_found_page(&state).await;
    };

    let description = if article.meta_description.is_empty() {
        article.summary().to_string()
    } else {
        article.meta_description.clone()
    };

    let template = ArticleTemplate {
        layout: Layout::load(&state, article.title.clone(), description).await,
        author: article.author_name(),
        sections: article.ordered_sections(),
        faqs: article.ordered_faqs(),
        article,
        base_path: kind.site_path(),
        section_label: kind.label(),
    };
    render(StatusCode::OK, &template)
}

pub async fn blog_index(State(state): State<SharedState>) -> Result<Response, AppError> {
    index(state, ContentKind::Blog).await
}

pub async fn blog_show(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    show(state, ContentKind::Blog, &slug).await
}

pub async fn product_index(State(state): State<SharedState>) -> Result<Response, AppError> {
    index(state, ContentKind::Product).await
}

pub async fn product_show(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    show(state, ContentKind::Product, &slug).await
}

pub async fn usecase_index(State(state): State<SharedState>) -> Result<Response, AppError> {
    index(state, ContentKind::Usecase).await
}

pub async fn usecase_show(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    show(state, ContentKind::Usecase, &slug).await
}
