//! Runtime settings, read from the environment (and `.env` when present).

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::logging::LogFormat;

pub const DEFAULT_SAFE_BROWSING_ENDPOINT: &str =
    "https://safebrowsing.googleapis.com/v4/threatMatches:find";
pub const DEFAULT_VIRUSTOTAL_BASE_URL: &str = "https://www.virustotal.com/api/v3";
pub const DEFAULT_USER_AGENT: &str = "UrlVerdict/0.1 (+https://github.com/url-verdict)";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// How (and whether) target pages are scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    Off,
    Http,
    Headless,
}

impl FromStr for ScrapeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "false" => Ok(ScrapeMode::Off),
            "http" | "fetch" => Ok(ScrapeMode::Http),
            "headless" | "browser" => Ok(ScrapeMode::Headless),
            _ => Err(ConfigError::Invalid {
                var: "SCRAPE_MODE",
                expected: "one of off, http, headless",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub workers: usize,

    pub google_api_key: Option<String>,
    pub virustotal_api_key: Option<String>,
    pub safe_browsing_endpoint: String,
    pub virustotal_base_url: String,
    /// Fixed wait between VirusTotal submit and report fetch.
    pub analysis_delay: Duration,
    pub upstream_timeout: Duration,

    pub scrape_mode: ScrapeMode,
    pub scrape_timeout: Duration,
    pub scrape_max_concurrent: usize,
    pub user_agent: String,

    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            workers: 2,
            google_api_key: None,
            virustotal_api_key: None,
            safe_browsing_endpoint: DEFAULT_SAFE_BROWSING_ENDPOINT.into(),
            virustotal_base_url: DEFAULT_VIRUSTOTAL_BASE_URL.into(),
            analysis_delay: Duration::from_secs(15),
            upstream_timeout: Duration::from_secs(20),
            scrape_mode: ScrapeMode::Http,
            scrape_timeout: Duration::from_secs(20),
            scrape_max_concurrent: 4,
            user_agent: DEFAULT_USER_AGENT.into(),
            cors_allowed_origins: Vec::new(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let d = Settings::default();

        Ok(Settings {
            host: get("HOST").unwrap_or(d.host),
            port: parse_or("PORT", get("PORT"), d.port, "a port number")?,
            workers: parse_or("HTTP_WORKERS", get("HTTP_WORKERS"), d.workers, "a worker count")?
                .max(1),

            google_api_key: get("GOOGLE_API_KEY"),
            virustotal_api_key: get("VIRUSTOTAL_API_KEY").or_else(|| get("API_KEY")),
            safe_browsing_endpoint: get("SAFE_BROWSING_ENDPOINT")
                .unwrap_or(d.safe_browsing_endpoint),
            virustotal_base_url: get("VIRUSTOTAL_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(d.virustotal_base_url),
            analysis_delay: secs_or(
                "VT_ANALYSIS_DELAY_SECS",
                get("VT_ANALYSIS_DELAY_SECS"),
                d.analysis_delay,
            )?,
            upstream_timeout: secs_or(
                "UPSTREAM_TIMEOUT_SECS",
                get("UPSTREAM_TIMEOUT_SECS"),
                d.upstream_timeout,
            )?,

            scrape_mode: match get("SCRAPE_MODE") {
                None => d.scrape_mode,
                Some(v) => v.parse()?,
            },
            scrape_timeout: secs_or(
                "SCRAPE_TIMEOUT_SECS",
                get("SCRAPE_TIMEOUT_SECS"),
                d.scrape_timeout,
            )?,
            scrape_max_concurrent: parse_or(
                "SCRAPE_MAX_CONCURRENT",
                get("SCRAPE_MAX_CONCURRENT"),
                d.scrape_max_concurrent,
                "a positive integer",
            )?
            .max(1),
            user_agent: get("USER_AGENT").unwrap_or(d.user_agent),

            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_format: match get("LOG_FORMAT") {
                None => d.log_format,
                Some(v) => v.parse()?,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value: v,
        }),
    }
}

fn secs_or(
    var: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    parse_or(var, raw, default.as_secs(), "a number of seconds").map(Duration::from_secs)
}
