use actix_cors::Cors;
use actix_web::{error::JsonPayloadError, get, http::header, post, web, HttpRequest, HttpResponse};
use tracing::warn;

use crate::checker::UrlChecker;
use crate::error::ApiError;
use crate::types::{CheckRequest, Health};
use crate::validate::parse_target;

fn health_body() -> Health {
    Health {
        status: "ok".into(),
        service: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
    }
}

#[get("/")]
async fn index() -> web::Json<Health> {
    web::Json(health_body())
}

#[get("/health")]
async fn health() -> web::Json<Health> {
    web::Json(health_body())
}

/* ------------------------ /check-url ------------------------ */

#[post("/check-url")]
async fn check_url(
    payload: web::Json<CheckRequest>,
    checker: web::Data<UrlChecker>,
) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let target = parse_target(req.url.as_deref()).map_err(|e| {
        warn!(error = %e, raw = ?req.url, "rejected check request");
        e
    })?;

    let verdict = checker.check(&target).await?;
    Ok(HttpResponse::Ok().json(verdict))
}

/// Malformed or non-JSON bodies get the same `{ error }` shape as other 400s.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid request body: {err}")).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(16 * 1024).error_handler(json_error))
        .service(index)
        .service(health)
        .service(check_url);
}

/// Permissive unless an origin list is given.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let base = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if allowed_origins.is_empty() {
        base.allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(base, |cors, origin| cors.allowed_origin(origin))
    }
}
