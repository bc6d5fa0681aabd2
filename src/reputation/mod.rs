//! Third-party URL reputation services.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use url::Url;

use crate::error::UpstreamError;
use crate::types::{ThreatMatch, VirusTotalReport};

pub mod safe_browsing;
pub mod virustotal;

pub use safe_browsing::SafeBrowsingClient;
pub use virustotal::VirusTotalClient;

/// Looks a URL up in a threat list. An empty vec means no matches.
#[async_trait]
pub trait ThreatLookup: Send + Sync {
    async fn find_threats(&self, url: &Url) -> Result<Vec<ThreatMatch>, UpstreamError>;
}

/// Submits a URL for scanning and returns the resulting report.
#[async_trait]
pub trait UrlScanner: Send + Sync {
    async fn scan(&self, url: &Url) -> Result<VirusTotalReport, UpstreamError>;
}

/// Client shared by the reputation services.
pub fn api_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .context("failed to build API client")
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Turn a non-2xx response into an error, keeping the API's own message
/// (`{"error": {"message": ...}}`, used by both Google and VirusTotal).
async fn status_error(service: &'static str, resp: Response) -> UpstreamError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
    UpstreamError::Status {
        service,
        status: status.as_u16(),
        message,
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    resp: Response,
) -> Result<T, UpstreamError> {
    if !resp.status().is_success() {
        return Err(status_error(service, resp).await);
    }
    let body = resp
        .bytes()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;
    serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode {
        service,
        detail: e.to_string(),
    })
}
