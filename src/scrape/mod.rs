//! Best-effort page scraping: final URL, title and meta description.
//!
//! Scrapers never fail. Anything that goes wrong yields placeholder text.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::config::{ScrapeMode, Settings};
use crate::types::PageSummary;
use crate::validate::Target;

#[cfg(feature = "headless")]
pub mod headless;
pub mod http;

pub use http::{ScrapeClient, MAX_BODY_BYTES};

pub const TITLE_UNAVAILABLE: &str = "Unable to fetch title";
pub const DESCRIPTION_UNAVAILABLE: &str = "Unable to fetch description";
pub const NO_TITLE: &str = "No title found";
pub const NO_DESCRIPTION: &str = "No description available";

#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn summarize(&self, target: &Target) -> PageSummary;
}

/// Title and description as found in the document, if any.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PageMeta {
    pub fn into_summary(self, final_url: &Url) -> PageSummary {
        PageSummary {
            final_url: final_url.to_string(),
            title: self.title.unwrap_or_else(|| NO_TITLE.to_string()),
            description: self.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        }
    }
}

/// Summary used when the page could not be fetched at all. `finalURL` is
/// the URL exactly as the client sent it.
pub fn unavailable(target: &Target) -> PageSummary {
    PageSummary {
        final_url: target.input.clone(),
        title: TITLE_UNAVAILABLE.to_string(),
        description: DESCRIPTION_UNAVAILABLE.to_string(),
    }
}

fn first_attr(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .filter_map(|m| m.value().attr(attr))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

pub fn extract_meta(html: &str) -> PageMeta {
    let doc = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|sel| {
        doc.select(&sel)
            .next()
            .map(|n| {
                n.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|s| !s.is_empty())
    });

    let description = first_attr(&doc, "meta[name=description]", "content")
        .or_else(|| first_attr(&doc, r#"meta[property="og:description"]"#, "content"));

    PageMeta { title, description }
}

/// Build the scraper selected by `SCRAPE_MODE`, or `None` when scraping is off.
pub fn from_settings(settings: &Settings) -> Result<Option<Arc<dyn PageScraper>>> {
    match settings.scrape_mode {
        ScrapeMode::Off => Ok(None),
        ScrapeMode::Http => {
            let sc = ScrapeClient::new(
                &settings.user_agent,
                settings.scrape_timeout,
                settings.scrape_max_concurrent,
            )?;
            let scraper: Arc<dyn PageScraper> = Arc::new(sc);
            Ok(Some(scraper))
        }
        #[cfg(feature = "headless")]
        ScrapeMode::Headless => {
            let scraper: Arc<dyn PageScraper> = Arc::new(headless::HeadlessScraper::new(
                &settings.user_agent,
                settings.scrape_timeout,
                settings.scrape_max_concurrent,
            ));
            Ok(Some(scraper))
        }
        #[cfg(not(feature = "headless"))]
        ScrapeMode::Headless => {
            anyhow::bail!("SCRAPE_MODE=headless requires building with the `headless` feature")
        }
    }
}
