//! Headless Chromium scraping for JavaScript-rendered pages.
//!
//! One browser per request, torn down when the request ends. The shared
//! semaphore caps how many run at once.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use super::{extract_meta, unavailable, PageScraper};
use crate::types::PageSummary;
use crate::validate::Target;

#[derive(Clone)]
pub struct HeadlessScraper {
    user_agent: String,
    timeout: Duration,
    limit: Arc<Semaphore>,
}

impl HeadlessScraper {
    pub fn new(user_agent: &str, timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            timeout,
            limit: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    async fn render(&self, url: &Url) -> Result<PageSummary> {
        if !(url.scheme() == "https" || url.scheme() == "http") {
            bail!("unsupported scheme {}", url.scheme());
        }

        let _permit = self
            .limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("semaphore closed"))?;

        let target = url.to_string();
        let user_agent = self.user_agent.clone();
        let timeout = self.timeout;

        let (final_url, html) = tokio::task::spawn_blocking(move || -> Result<(String, String)> {
            let options = LaunchOptions::default_builder()
                .headless(true)
                .idle_browser_timeout(timeout)
                .build()
                .map_err(|e| anyhow!("browser launch options: {e}"))?;
            let browser = Browser::new(options)?;
            let tab = browser.new_tab()?;
            tab.set_default_timeout(timeout);
            tab.set_user_agent(&user_agent, None, None)?;
            tab.navigate_to(&target)?.wait_until_navigated()?;
            let html = tab.get_content()?;
            Ok((tab.get_url(), html))
        })
        .await??;

        let final_url = Url::parse(&final_url).unwrap_or_else(|_| url.clone());
        Ok(extract_meta(&html).into_summary(&final_url))
    }
}

#[async_trait]
impl PageScraper for HeadlessScraper {
    async fn summarize(&self, target: &Target) -> PageSummary {
        let url = &target.url;
        match self.render(url).await {
            Ok(summary) => {
                debug!(url = %url, final_url = %summary.final_url, "page rendered");
                summary
            }
            Err(e) => {
                warn!(error = %e, url = %url, "headless scrape failed, using placeholders");
                unavailable(target)
            }
        }
    }
}
