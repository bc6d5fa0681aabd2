use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{redirect::Policy, Client, StatusCode};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use super::{extract_meta, unavailable, PageScraper};
use crate::types::PageSummary;
use crate::validate::Target;

/// Pages larger than this are truncated before parsing.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Plain HTTP fetch + DOM parse.
#[derive(Clone)]
pub struct ScrapeClient {
    pub(crate) http: Client,
    limit: Arc<Semaphore>,
}

pub struct FetchedPage {
    pub final_url: Url,
    pub status: StatusCode,
    pub content_type: String,
    pub body: Bytes,
}

impl ScrapeClient {
    pub fn new(user_agent: &str, timeout: Duration, max_concurrent: usize) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(Policy::limited(8))
            .timeout(timeout)
            .build()
            .context("failed to build scrape client")?;

        Ok(Self {
            http,
            limit: Arc::new(Semaphore::new(max_concurrent.max(1))),
        })
    }

    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedPage> {
        let _permit = self
            .limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("semaphore closed"))?;

        let mut res = self.http.get(url.clone()).send().await?;
        let final_url = res.url().clone();
        let status = res.status();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let mut buf = BytesMut::new();
        while let Some(chunk) = res.chunk().await? {
            let room = MAX_BODY_BYTES - buf.len();
            if chunk.len() >= room {
                buf.extend_from_slice(&chunk[..room]);
                break;
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(FetchedPage {
            final_url,
            status,
            content_type,
            body: buf.freeze(),
        })
    }
}

pub async fn scrape_one(sc: &ScrapeClient, url: &Url) -> Result<PageSummary> {
    if !(url.scheme() == "https" || url.scheme() == "http") {
        bail!("unsupported scheme {}", url.scheme());
    }

    let page = sc.fetch_page(url).await?;
    if !page.status.is_success() {
        bail!("http status {}", page.status.as_u16());
    }

    // A missing content type is given the benefit of the doubt.
    let ct = page.content_type.to_lowercase();
    if !ct.is_empty() && !ct.starts_with("text/html") && !ct.starts_with("application/xhtml") {
        bail!("content-type not html: {}", page.content_type);
    }

    let html = String::from_utf8_lossy(&page.body);
    Ok(extract_meta(&html).into_summary(&page.final_url))
}

#[async_trait]
impl PageScraper for ScrapeClient {
    async fn summarize(&self, target: &Target) -> PageSummary {
        let url = &target.url;
        match scrape_one(self, url).await {
            Ok(summary) => {
                debug!(url = %url, final_url = %summary.final_url, "page scraped");
                summary
            }
            Err(e) => {
                warn!(error = %e, url = %url, "scrape failed, using placeholders");
                unavailable(target)
            }
        }
    }
}
