//! Connection and polling settings for the currency-exchange API.

use serde::Deserialize;
use std::time::Duration;

use crate::core::error::ConfigError;
use crate::core::utils::parse_var;

use super::types::SummaryRequest;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExchangeApiConfig {
    /// Scheme and host of the backend, without port
    pub base_url: String,
    pub port: u16,
    /// Path segment(s) in front of `currency-exchange-summary`
    pub path_prefix: String,
    pub request_timeout_ms: u64,
    /// Wait between a successful trigger and the first fetch
    pub initial_delay_ms: u64,
    /// Total fetches allowed while the backend reports "not ready"
    pub max_attempts: u32,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
    pub user_agent: String,
}

impl Default for ExchangeApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            port: 5170,
            path_prefix: "api".to_string(),
            request_timeout_ms: 10_000,
            initial_delay_ms: 101,
            max_attempts: 5,
            backoff_multiplier: 2.0,
            max_delay_ms: 2_000,
            user_agent: concat!("savings-mcp-server/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ExchangeApiConfig {
    /// Apply `EXCHANGE_API_BASE_URL` and `EXCHANGE_API_PORT` from `lookup`.
    pub fn apply_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(base_url) = lookup("EXCHANGE_API_BASE_URL").filter(|s| !s.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(port) = lookup("EXCHANGE_API_PORT").filter(|s| !s.is_empty()) {
            self.port = parse_var("EXCHANGE_API_PORT", &port)?;
        }
        Ok(self)
    }

    /// Resource URI shared by the trigger and fetch calls.
    ///
    /// Path segments and `toDate` are inserted verbatim.
    pub fn summary_uri(&self, request: &SummaryRequest) -> String {
        let mut uri = format!("{}:{}", self.base_url.trim_end_matches('/'), self.port);

        let prefix = self.path_prefix.trim_matches('/');
        if !prefix.is_empty() {
            uri.push('/');
            uri.push_str(prefix);
        }

        uri.push_str(&format!(
            "/currency-exchange-summary/{}/{}/{}",
            request.source_currency, request.target_currency, request.start_date
        ));

        if let Some(end_date) = &request.end_date {
            uri.push_str("?toDate=");
            uri.push_str(end_date);
        }
        uri
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before the fetch that follows one waited for `previous`.
    pub fn next_delay(&self, previous: Duration) -> Duration {
        let multiplier = if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0 {
            self.backoff_multiplier
        } else {
            1.0
        };
        let cap = Duration::from_millis(self.max_delay_ms);
        let next = (previous.as_secs_f64() * multiplier).min(cap.as_secs_f64());
        Duration::from_secs_f64(next)
    }
}
