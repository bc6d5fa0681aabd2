// Shared helpers: an in-process fake upstream and stub services.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{get, post, web, App, HttpRequest, HttpResponse, HttpServer};
use async_trait::async_trait;
use serde_json::json;
use url::Url;

use url_verdict::checker::UrlChecker;
use url_verdict::error::UpstreamError;
use url_verdict::reputation::{ThreatLookup, UrlScanner};
use url_verdict::scrape::PageScraper;
use url_verdict::types::{AnalysisStats, PageSummary, ThreatEntry, ThreatMatch, VirusTotalReport};
use url_verdict::validate::Target;

pub const TEST_KEY: &str = "test-key";

/// Bind a real server on an ephemeral loopback port and return its base URL.
pub fn spawn_upstream<F>(configure: F) -> String
where
    F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
{
    let server = HttpServer::new(move || App::new().configure(configure.clone()))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{addr}")
}

fn authorized(req: &HttpRequest) -> bool {
    req.headers()
        .get("x-apikey")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == TEST_KEY)
}

fn wrong_key() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "error": { "code": "WrongCredentialsError", "message": "Wrong API key" }
    }))
}

#[post("/api/v3/urls")]
async fn vt_submit(req: HttpRequest, form: web::Form<HashMap<String, String>>) -> HttpResponse {
    if !authorized(&req) {
        return wrong_key();
    }
    match form.get("url") {
        Some(u) if u.contains("queued") => {
            HttpResponse::Ok().json(json!({ "data": { "type": "analysis", "id": "u-queued" } }))
        }
        Some(_) => {
            HttpResponse::Ok().json(json!({ "data": { "type": "analysis", "id": "u-done" } }))
        }
        None => HttpResponse::BadRequest().json(json!({
            "error": { "code": "BadRequestError", "message": "url missing" }
        })),
    }
}

#[get("/api/v3/analyses/{id}")]
async fn vt_analysis(req: HttpRequest, id: web::Path<String>) -> HttpResponse {
    if !authorized(&req) {
        return wrong_key();
    }
    let attributes = if id.as_str() == "u-queued" {
        json!({ "status": "queued", "stats": {} })
    } else {
        json!({
            "status": "completed",
            "stats": { "malicious": 1, "suspicious": 0, "harmless": 65, "undetected": 22, "timeout": 0 },
            "results": {
                "Fortinet": { "engine_name": "Fortinet", "category": "malicious", "result": "phishing" },
                "Sophos": { "engine_name": "Sophos", "category": "harmless", "result": "clean" }
            }
        })
    };
    HttpResponse::Ok().json(json!({
        "data": { "id": id.into_inner(), "type": "analysis", "attributes": attributes }
    }))
}

#[post("/v4/threatMatches:find")]
async fn sb_find(
    query: web::Query<HashMap<String, String>>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    if query.get("key").map(String::as_str) != Some(TEST_KEY) {
        return HttpResponse::BadRequest().json(json!({
            "error": { "code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT" }
        }));
    }
    let url = body["threatInfo"]["threatEntries"][0]["url"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    if url.contains("malware") {
        HttpResponse::Ok().json(json!({
            "matches": [{
                "threatType": "MALWARE",
                "platformType": "ANY_PLATFORM",
                "threatEntryType": "URL",
                "threat": { "url": url },
                "cacheDuration": "300s"
            }]
        }))
    } else {
        HttpResponse::Ok().json(json!({}))
    }
}

#[get("/start")]
async fn page_start() -> HttpResponse {
    HttpResponse::Found()
        .insert_header(("Location", "/landing"))
        .finish()
}

#[get("/landing")]
async fn page_landing() -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(
        r#"<!doctype html><html><head>
            <title>Landing Page</title>
            <meta name="description" content="Where redirects end up.">
        </head><body>hello</body></html>"#,
    )
}

#[get("/bare")]
async fn page_bare() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html")
        .body("<html><body>no head here</body></html>")
}

/// Title up front, then well past the scrape body cap.
pub const HUGE_PAGE_BYTES: usize = 3 * 1024 * 1024;

#[get("/huge")]
async fn page_huge() -> HttpResponse {
    let mut body = String::from("<html><head><title>Huge Page</title></head><body><p>");
    body.push_str(&"x".repeat(HUGE_PAGE_BYTES));
    body.push_str("</p></body></html>");
    HttpResponse::Ok().content_type("text/html").body(body)
}

#[get("/broken")]
async fn page_broken() -> HttpResponse {
    HttpResponse::InternalServerError().body("boom")
}

#[get("/data.json")]
async fn page_json() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "not": "html" }))
}

/// Fake Google, VirusTotal and a few web pages on one server.
pub fn fake_internet(cfg: &mut web::ServiceConfig) {
    cfg.service(vt_submit)
        .service(vt_analysis)
        .service(sb_find)
        .service(page_start)
        .service(page_landing)
        .service(page_bare)
        .service(page_huge)
        .service(page_broken)
        .service(page_json);
}

/// Tracks how many requests a route is serving at once.
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    served: AtomicUsize,
}

impl Gauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

async fn slow_page(gauge: web::Data<Gauge>) -> HttpResponse {
    let now = gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
    gauge.peak.fetch_max(now, Ordering::SeqCst);
    actix_web::rt::time::sleep(Duration::from_millis(150)).await;
    gauge.current.fetch_sub(1, Ordering::SeqCst);
    gauge.served.fetch_add(1, Ordering::SeqCst);
    HttpResponse::Ok()
        .content_type("text/html")
        .body("<html><head><title>Slow</title></head></html>")
}

/// `GET /slow`, recording concurrency into `gauge`.
pub fn slow_pages(
    gauge: Arc<Gauge>,
) -> impl Fn(&mut web::ServiceConfig) + Send + Clone + 'static {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::from(gauge.clone()))
            .route("/slow", web::get().to(slow_page));
    }
}

pub fn target(raw: &str) -> Target {
    url_verdict::validate::parse_target(Some(raw)).unwrap()
}

/* ------------------------ in-process stubs ------------------------ */

pub struct StubLookup {
    pub flag: bool,
}

#[async_trait]
impl ThreatLookup for StubLookup {
    async fn find_threats(&self, url: &Url) -> Result<Vec<ThreatMatch>, UpstreamError> {
        if !self.flag {
            return Ok(vec![]);
        }
        Ok(vec![ThreatMatch {
            threat_type: "SOCIAL_ENGINEERING".into(),
            platform_type: "ANY_PLATFORM".into(),
            threat_entry_type: Some("URL".into()),
            threat: ThreatEntry { url: url.to_string() },
            cache_duration: None,
        }])
    }
}

pub struct StubScanner {
    pub fail: bool,
}

#[async_trait]
impl UrlScanner for StubScanner {
    async fn scan(&self, _url: &Url) -> Result<VirusTotalReport, UpstreamError> {
        if self.fail {
            return Err(UpstreamError::Status {
                service: "VirusTotal",
                status: 503,
                message: "Service Unavailable".into(),
            });
        }
        Ok(VirusTotalReport {
            analysis_id: "u-stub".into(),
            status: "completed".into(),
            stats: AnalysisStats {
                harmless: 70,
                undetected: 10,
                ..AnalysisStats::default()
            },
            results: None,
        })
    }
}

pub struct StubScraper;

#[async_trait]
impl PageScraper for StubScraper {
    async fn summarize(&self, target: &Target) -> PageSummary {
        PageSummary {
            final_url: format!("{}landing", target.url),
            title: "Stub Title".into(),
            description: "Stub description".into(),
        }
    }
}

pub fn stub_checker(flag: bool, vt_fail: bool) -> UrlChecker {
    UrlChecker::new()
        .with_safe_browsing(Arc::new(StubLookup { flag }))
        .with_virustotal(Arc::new(StubScanner { fail: vt_fail }))
        .with_scraper(Arc::new(StubScraper))
}
