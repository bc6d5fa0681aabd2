//! URL reputation proxy.
//!
//! `POST /check-url` takes `{ "url": ... }`, asks Google Safe Browsing and
//! VirusTotal about it (whichever have API keys), optionally scrapes the page
//! for its title, description and final URL, and answers with one JSON verdict.

pub mod checker;
pub mod config;
pub mod error;
pub mod logging;
pub mod reputation;
pub mod routes;
pub mod scrape;
pub mod types;
pub mod validate;
