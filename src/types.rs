use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /check-url`. `url` is optional so a missing field reaches
/// the validator instead of failing JSON extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEntry {
    pub url: String,
}

/// One Safe Browsing match, passed through as Google reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    pub threat_type: String,
    pub platform_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_entry_type: Option<String>,
    pub threat: ThreatEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    #[serde(default)]
    pub malicious: u32,
    #[serde(default)]
    pub suspicious: u32,
    #[serde(default)]
    pub harmless: u32,
    #[serde(default)]
    pub undetected: u32,
    #[serde(default)]
    pub timeout: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirusTotalReport {
    pub analysis_id: String,
    /// `completed`, or `queued`/`in-progress` when the fixed wait was too short.
    pub status: String,
    pub stats: AnalysisStats,
    /// Per-engine verdicts, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
}

impl VirusTotalReport {
    pub fn is_complete(&self) -> bool {
        self.status == "completed"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    #[serde(rename = "finalURL")]
    pub final_url: String,
    pub title: String,
    pub description: String,
}

/// Combined verdict. Sections are present only for the services consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    #[serde(rename = "originalURL")]
    pub original_url: String,
    #[serde(rename = "checkedAt")]
    pub checked_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threats: Option<Vec<ThreatMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(flatten)]
    pub page: Option<PageSummary>,

    #[serde(rename = "virusTotal", default, skip_serializing_if = "Option::is_none")]
    pub virus_total: Option<VirusTotalReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub service: String,
    pub version: String,
}
