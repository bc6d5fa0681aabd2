//! VirusTotal v3 URL scanning: submit, wait, fetch the analysis.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::{read_json, UrlScanner};
use crate::error::UpstreamError;
use crate::types::{AnalysisStats, VirusTotalReport};

const SERVICE: &str = "VirusTotal";

#[derive(Clone)]
pub struct VirusTotalClient {
    http: Client,
    api_key: String,
    base_url: String,
    /// Fixed wait before fetching the report. No polling.
    delay: Duration,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct Submitted {
    id: String,
}

#[derive(Deserialize)]
struct Analysis {
    attributes: AnalysisAttributes,
}

#[derive(Deserialize)]
struct AnalysisAttributes {
    #[serde(default)]
    status: String,
    #[serde(default)]
    stats: AnalysisStats,
    #[serde(default)]
    results: Option<Value>,
}

impl VirusTotalClient {
    pub fn new(
        http: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            delay,
        }
    }

    /// Submit the URL and return the analysis id.
    pub async fn submit(&self, url: &Url) -> Result<String, UpstreamError> {
        let resp = self
            .http
            .post(format!("{}/urls", self.base_url))
            .header("x-apikey", &self.api_key)
            .form(&[("url", url.as_str())])
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { service: SERVICE, source })?;

        let submitted: Envelope<Submitted> = read_json(SERVICE, resp).await?;
        if submitted.data.id.is_empty() {
            return Err(UpstreamError::Decode {
                service: SERVICE,
                detail: "empty analysis id".into(),
            });
        }
        Ok(submitted.data.id)
    }

    pub async fn fetch_report(&self, analysis_id: &str) -> Result<VirusTotalReport, UpstreamError> {
        let resp = self
            .http
            .get(format!("{}/analyses/{}", self.base_url, analysis_id))
            .header("x-apikey", &self.api_key)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { service: SERVICE, source })?;

        let analysis: Envelope<Analysis> = read_json(SERVICE, resp).await?;
        let attrs = analysis.data.attributes;
        Ok(VirusTotalReport {
            analysis_id: analysis_id.to_string(),
            status: attrs.status,
            stats: attrs.stats,
            // Engines that have not reported yet leave an empty map.
            results: attrs.results.filter(|r| r.as_object().map_or(true, |m| !m.is_empty())),
        })
    }
}

#[async_trait]
impl UrlScanner for VirusTotalClient {
    async fn scan(&self, url: &Url) -> Result<VirusTotalReport, UpstreamError> {
        let id = self.submit(url).await?;
        debug!(url = %url, analysis_id = %id, delay = ?self.delay, "virustotal analysis submitted");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let report = self.fetch_report(&id).await?;
        if !report.is_complete() {
            info!(
                analysis_id = %id,
                status = %report.status,
                "virustotal analysis not finished after fixed wait"
            );
        }
        Ok(report)
    }
}
