#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{Value, json};

use leadfunnel::config::{Config, LeadConfig};
use leadfunnel::funnel::{CrmForm, FunnelVariant};
use leadfunnel::lead::{FunnelKind, MemoryStore, RetryPolicy};
use leadfunnel::state::SharedState;

pub const CRM_FORM_URL: &str = "https://crm.test/crm/WebToLeadForm";

/// A running site wired to mock content and lead APIs.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
    pub lead_api: Arc<LeadApiMock>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a JSON lead to the API, return (body, status).
    pub async fn submit_lead(&self, funnel: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/api/v1/leads/{funnel}")))
            .json(body)
            .send()
            .await
            .expect("submit lead failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// POST an urlencoded form, return (html, status).
    pub async fn post_form(&self, path: &str, data: &[(&str, &str)]) -> (String, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .form(data)
            .send()
            .await
            .expect("form post failed");
        let status = resp.status();
        (resp.text().await.unwrap_or_default(), status)
    }

    pub async fn get_page(&self, path: &str) -> (String, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        (resp.text().await.unwrap_or_default(), status)
    }

    pub async fn queue_len(&self, funnel: FunnelKind) -> usize {
        self.state
            .leads
            .get(funnel)
            .queue()
            .len()
            .await
            .expect("queue read failed")
    }

    /// Background drains are spawned by page loads; wait for the queue to
    /// reach `expected` items.
    pub async fn wait_for_queue_len(&self, funnel: FunnelKind, expected: usize) {
        for _ in 0..100 {
            if self.queue_len(funnel).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "queue for {funnel} never reached {expected} (now {})",
            self.queue_len(funnel).await
        );
    }
}

// ── Mock lead API ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedLead {
    pub path: String,
    pub idempotency_key: Option<String>,
    pub body: Value,
}

/// Lead backend double. Answers with a scripted status per request, falling
/// back to `default_status` once the script runs out. Successful answers
/// carry incrementing ids starting at 42.
pub struct LeadApiMock {
    pub addr: SocketAddr,
    requests: Mutex<Vec<RecordedLead>>,
    script: Mutex<VecDeque<u16>>,
    default_status: AtomicU16,
    next_id: AtomicI64,
}

impl LeadApiMock {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Fail the next `n` requests with a 503.
    pub fn fail_next(&self, n: usize) {
        let mut script = self.script.lock().unwrap();
        script.extend(std::iter::repeat_n(503, n));
    }

    /// Take the backend down (or bring it back) for every unscripted request.
    pub fn set_down(&self, down: bool) {
        let status = if down { 503 } else { 201 };
        self.default_status.store(status, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedLead> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn receive_lead(
    State(mock): State<Arc<LeadApiMock>>,
    Path(funnel_path): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.requests.lock().unwrap().push(RecordedLead {
        path: funnel_path,
        idempotency_key: headers
            .get("idempotency-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let scripted = mock.script.lock().unwrap().pop_front();
    let status = scripted.unwrap_or_else(|| mock.default_status.load(Ordering::SeqCst));
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if !status.is_success() {
        return (status, "backend unavailable").into_response();
    }

    let id = mock.next_id.fetch_add(1, Ordering::SeqCst);
    (
        status,
        Json(json!({ "id": id, "bookingUrl": format!("https://cal.example/{id}") })),
    )
        .into_response()
}

async fn spawn_lead_api() -> Arc<LeadApiMock> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind lead API mock");
    let addr = listener.local_addr().unwrap();

    let mock = Arc::new(LeadApiMock {
        addr,
        requests: Mutex::new(Vec::new()),
        script: Mutex::new(VecDeque::new()),
        default_status: AtomicU16::new(201),
        next_id: AtomicI64::new(42),
    });

    let app = Router::new()
        .route("/api/{funnel_path}/", post(receive_lead))
        .with_state(mock.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Lead API mock failed");
    });

    mock
}

// ── Mock content API ────────────────────────────────────────────

fn blog_post() -> Value {
    json!({
        "id": 1,
        "title": "Automating invoices with AI",
        "slug_path": "automating-invoices",
        "excerpt": "How small teams stop typing invoices by hand.",
        "meta_description": "Invoice automation for small teams",
        "page_published_time": "2024-05-01",
        "updated_at": "2024-05-02T09:30:00+02:00",
        "author": { "username": "giulia" },
        "sections": [
            { "id": 2, "title": "Second step", "content": "<p>Review</p>", "order": 2, "subsections": [] },
            { "id": 1, "title": "First step", "content": "<p>Collect</p>", "order": 1, "subsections": [] }
        ],
        "faqs": [
            { "question": "Does it work with PDFs?", "answer": "<p>Yes.</p>", "order": 1 }
        ]
    })
}

fn product() -> Value {
    json!({
        "id": 7,
        "title": "AI Chatbot",
        "slug_path": "ai-chatbot",
        "intro": "A support assistant trained on your documents.",
        "updated_at": "2024-06-10T12:00:00Z"
    })
}

async fn blog_detail(Path(slug): Path<String>) -> Response {
    if slug == "automating-invoices" {
        Json(blog_post()).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
    }
}

async fn spawn_content_api() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind content API mock");
    let addr = listener.local_addr().unwrap();

    let app = Router::new()
        .route(
            "/api/blogs/",
            get(|| async { Json(json!({ "results": [blog_post()], "count": 1 })) }),
        )
        .route("/api/blogs/recent/", get(|| async { Json(json!([blog_post()])) }))
        .route("/api/blogs/{slug}/", get(blog_detail))
        .route("/api/product-pages/", get(|| async { Json(json!([product()])) }))
        // Use cases are broken upstream; pages must still render
        .route(
            "/api/usecases/",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/api/homepage/",
            get(|| async {
                Json(json!([{
                    "title_h": "Grow faster with AI",
                    "solution_subtitle": "Automation for ambitious small businesses",
                    "mission_title_h": "Our mission",
                    "mission_paragraph": "Make AI useful for everyone."
                }]))
            }),
        )
        .route(
            "/api/about/",
            get(|| async {
                Json(json!({ "results": [{
                    "title": "About Grow to Prime",
                    "content": "<p>We help companies adopt AI.</p>"
                }] }))
            }),
        )
        .route(
            "/api/stats/navigation/",
            get(|| async {
                Json(json!({
                    "blogs": [],
                    "product_pages": [{ "id": 7, "title": "AI Chatbot", "slug_path": "ai-chatbot" }],
                    "usecases": []
                }))
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Content API mock failed");
    });

    addr
}

// ── App ─────────────────────────────────────────────────────────

pub fn test_config(content_api_url: &str, lead_api_url: &str) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "https://site.test".to_string(),
        content_api_url: content_api_url.to_string(),
        content_timeout: Duration::from_secs(2),
        leads: LeadConfig {
            consultation_endpoint: format!("{lead_api_url}/api/consultation-leads/"),
            ebook_endpoint: format!("{lead_api_url}/api/ebook-leads/"),
            timeout: Duration::from_secs(2),
            retry: RetryPolicy {
                max_attempts: 3,
                backoff_step: Duration::from_millis(10),
            },
        },
        crm: CrmForm {
            action_url: CRM_FORM_URL.to_string(),
            content_type: "eBook".to_string(),
            thanks_url: "https://site.test/thanks".to_string(),
        },
        ebook_variant: FunnelVariant::EmbeddedMarkup,
        store_dir: None,
        rate_limit: 10,
        rate_limit_window_secs: 60,
        max_body_size: 65_536,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn the site with a tweaked config.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let content_addr = spawn_content_api().await;
    let lead_api = spawn_lead_api().await;

    let mut config = test_config(&format!("http://{content_addr}"), &lead_api.url());
    configure(&mut config);

    let (app, state) = leadfunnel::build_app(config, Arc::new(MemoryStore::new()))
        .expect("Failed to build app");

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        state,
        lead_api,
    }
}
