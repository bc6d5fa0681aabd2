//! Runs the configured lookups for one URL and merges them into a verdict.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use crate::config::Settings;
use crate::error::ApiError;
use crate::reputation::{self, SafeBrowsingClient, ThreatLookup, UrlScanner, VirusTotalClient};
use crate::scrape::{self, PageScraper};
use crate::types::CheckResponse;
use crate::validate::Target;

pub const NO_THREATS_MESSAGE: &str = "No threats found";

#[derive(Clone, Default)]
pub struct UrlChecker {
    pub safe_browsing: Option<Arc<dyn ThreatLookup>>,
    pub virustotal: Option<Arc<dyn UrlScanner>>,
    pub scraper: Option<Arc<dyn PageScraper>>,
}

impl UrlChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_safe_browsing(mut self, lookup: Arc<dyn ThreatLookup>) -> Self {
        self.safe_browsing = Some(lookup);
        self
    }

    pub fn with_virustotal(mut self, scanner: Arc<dyn UrlScanner>) -> Self {
        self.virustotal = Some(scanner);
        self
    }

    pub fn with_scraper(mut self, scraper: Arc<dyn PageScraper>) -> Self {
        self.scraper = Some(scraper);
        self
    }

    /// Wire up whichever services have credentials / are enabled.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api = reputation::api_client(&settings.user_agent, settings.upstream_timeout)?;
        let mut checker = UrlChecker::new();

        if let Some(key) = &settings.google_api_key {
            checker = checker.with_safe_browsing(Arc::new(SafeBrowsingClient::new(
                api.clone(),
                key.clone(),
                settings.safe_browsing_endpoint.clone(),
            )));
        }
        if let Some(key) = &settings.virustotal_api_key {
            checker = checker.with_virustotal(Arc::new(VirusTotalClient::new(
                api.clone(),
                key.clone(),
                settings.virustotal_base_url.clone(),
                settings.analysis_delay,
            )));
        }
        if let Some(scraper) = scrape::from_settings(settings)? {
            checker = checker.with_scraper(scraper);
        }
        Ok(checker)
    }

    pub fn services(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.safe_browsing.is_some() {
            out.push("safe_browsing");
        }
        if self.virustotal.is_some() {
            out.push("virustotal");
        }
        if self.scraper.is_some() {
            out.push("scraper");
        }
        out
    }

    pub async fn check(&self, target: &Target) -> Result<CheckResponse, ApiError> {
        let url = &target.url;
        let mut resp = CheckResponse {
            original_url: target.input.clone(),
            checked_at: Utc::now(),
            safe: None,
            threats: None,
            message: None,
            page: None,
            virus_total: None,
        };

        if let Some(sb) = &self.safe_browsing {
            let matches = sb.find_threats(url).await.map_err(|e| {
                error!(error = %e, url = %url, "safe browsing lookup failed");
                e
            })?;
            let safe = matches.is_empty();
            resp.safe = Some(safe);
            resp.message = safe.then(|| NO_THREATS_MESSAGE.to_string());
            resp.threats = Some(matches);
        }

        if let Some(vt) = &self.virustotal {
            let report = vt.scan(url).await.map_err(|e| {
                error!(error = %e, url = %url, "virustotal scan failed");
                e
            })?;
            resp.virus_total = Some(report);
        }

        if let Some(scraper) = &self.scraper {
            resp.page = Some(scraper.summarize(target).await);
        }

        info!(
            url = %url,
            safe = ?resp.safe,
            threats = resp.threats.as_ref().map_or(0, Vec::len),
            "url checked"
        );
        Ok(resp)
    }
}
