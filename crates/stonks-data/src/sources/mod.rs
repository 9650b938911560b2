//! Provider adapters.

mod google_trends;
mod yahoo;

#[cfg(test)]
mod test_server;

pub use google_trends::GoogleTrendsSource;
pub use yahoo::YahooFinanceSource;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stonks_core::error::{FetchError, StonksError, StonksResult};

/// Settings shared by the HTTP-backed sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Yahoo Finance API root
    pub yahoo_base_url: String,
    /// Google Trends root
    pub trends_base_url: String,
    /// Google Trends region
    pub trends_geo: String,
    /// Google Trends interface language
    pub trends_language: String,
    /// Google Trends timezone offset in minutes
    pub trends_tz_offset: i32,
    /// Honor HTTP(S)_PROXY from the environment
    pub use_system_proxy: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) stonks/0.1".to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            trends_base_url: "https://trends.google.com/trends".to_string(),
            trends_geo: "US".to_string(),
            trends_language: "en-US".to_string(),
            trends_tz_offset: 360,
            use_system_proxy: true,
        }
    }
}

impl SourceSettings {
    /// Build an HTTP client honoring the timeout and user agent.
    pub fn http_client(&self, cookies: bool) -> StonksResult<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.clone())
            .cookie_store(cookies);
        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }
        builder
            .build()
            .map_err(|e| StonksError::Config(format!("failed to build HTTP client: {}", e)))
    }
}

/// Map a transport-level reqwest error.
pub(crate) fn network_error(e: reqwest::Error) -> FetchError {
    match e.status() {
        Some(status) => FetchError::Http {
            status: status.as_u16(),
            url: e.url().map(|u| u.to_string()).unwrap_or_default(),
        },
        None => FetchError::Network(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_default_settings() {
        assert!(SourceSettings::default().http_client(true).is_ok());
    }

    #[test]
    fn test_http_client_rejects_invalid_user_agent() {
        let settings = SourceSettings {
            user_agent: "bad\nagent".to_string(),
            ..SourceSettings::default()
        };

        assert!(matches!(settings.http_client(false), Err(StonksError::Config(_))));
        assert!(matches!(
            YahooFinanceSource::new(&settings),
            Err(StonksError::Config(_))
        ));
        assert!(matches!(
            GoogleTrendsSource::new(&settings),
            Err(StonksError::Config(_))
        ));
    }
}
