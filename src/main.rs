use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use tracing::{info, warn};

use url_verdict::checker::UrlChecker;
use url_verdict::config::Settings;
use url_verdict::{logging, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Config
    let settings = Settings::from_env().context("invalid configuration")?;

    // Logging
    logging::init(settings.log_format);

    // Init subsystems
    let checker = UrlChecker::from_settings(&settings)?;
    let services = checker.services();
    if services.is_empty() {
        warn!("no API keys and scraping disabled; responses will carry only the URL");
    }
    info!(?services, scrape_mode = ?settings.scrape_mode, "checker ready");

    let addr = settings.bind_addr();
    let origins = settings.cors_allowed_origins.clone();
    let checker = web::Data::new(checker);

    info!("🌐 listening on {}", addr);
    HttpServer::new(move || {
        App::new()
            .app_data(checker.clone())
            .wrap(routes::cors(&origins))
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {addr}"))?
    .workers(settings.workers)
    .run()
    .await?;

    Ok(())
}
