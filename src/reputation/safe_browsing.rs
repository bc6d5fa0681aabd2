//! Google Safe Browsing v4 `threatMatches:find`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::{read_json, ThreatLookup};
use crate::error::UpstreamError;
use crate::types::ThreatMatch;

const SERVICE: &str = "Safe Browsing";

pub const THREAT_TYPES: [&str; 4] = [
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

#[derive(Clone)]
pub struct SafeBrowsingClient {
    http: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    matches: Vec<ThreatMatch>,
}

impl SafeBrowsingClient {
    pub fn new(http: Client, api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn request_body(url: &Url) -> Value {
        json!({
            "client": {
                "clientId": env!("CARGO_PKG_NAME"),
                "clientVersion": env!("CARGO_PKG_VERSION"),
            },
            "threatInfo": {
                "threatTypes": THREAT_TYPES,
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{ "url": url.as_str() }],
            }
        })
    }
}

#[async_trait]
impl ThreatLookup for SafeBrowsingClient {
    async fn find_threats(&self, url: &Url) -> Result<Vec<ThreatMatch>, UpstreamError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(url))
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { service: SERVICE, source })?;

        let found: FindResponse = read_json(SERVICE, resp).await?;
        debug!(url = %url, matches = found.matches.len(), "safe browsing lookup done");
        Ok(found.matches)
    }
}
