use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::content::{Article, ContentKind};
use crate::state::SharedState;

struct SitemapEntry {
    loc: String,
    lastmod: Option<String>,
    changefreq: &'static str,
    priority: f32,
}

pub async fn sitemap(State(state): State<SharedState>) -> Response {
    let base = state.config.base_url.trim_end_matches('/');

    let mut entries = vec![
        SitemapEntry {
            loc: format!("{base}/"),
            lastmod: None,
            changefreq: "weekly",
            priority: 1.0,
        },
        SitemapEntry {
            loc: format!("{base}/about"),
            lastmod: None,
            changefreq: "monthly",
            priority: 0.5,
        },
        SitemapEntry {
            loc: format!("{base}/consultation"),
            lastmod: None,
            changefreq: "monthly",
            priority: 0.5,
        },
    ];

    let (blogs, products, usecases) = tokio::join!(
        state.content.list(ContentKind::Blog),
        state.content.list(ContentKind::Product),
        state.content.list(ContentKind::Usecase),
    );

    for (kind, items) in [
        (ContentKind::Blog, blogs.results),
        (ContentKind::Product, products.results),
        (ContentKind::Usecase, usecases.results),
    ] {
        entries.extend(article_entries(base, kind, &items));
    }

    xml_response(render_urlset(&entries))
}

/// Product and service pages only.
pub async fn services_sitemap(State(state): State<SharedState>) -> Response {
    let base = state.config.base_url.trim_end_matches('/');
    let products = state.content.list(ContentKind::Product).await;
    let entries = article_entries(base, ContentKind::Product, &products.results);
    xml_response(render_urlset(&entries))
}

fn article_entries(base: &str, kind: ContentKind, items: &[Article]) -> Vec<SitemapEntry> {
    items
        .iter()
        .filter(|a| !a.slug_path.is_empty())
        .map(|a| SitemapEntry {
            loc: format!("{base}/{}/{}", kind.site_path(), a.slug_path),
            lastmod: a.updated_at.as_deref().and_then(format_lastmod),
            changefreq: "weekly",
            priority: kind.sitemap_priority(),
        })
        .collect()
}

fn format_lastmod(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn render_urlset(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">",
    );
    for entry in entries {
        xml.push_str("\n  <url>\n    <loc>");
        xml.push_str(&escape_xml(&entry.loc));
        xml.push_str("</loc>\n");
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>",
            entry.changefreq, entry.priority
        ));
    }
    xml.push_str("\n</urlset>\n");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn xml_response(xml: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}
