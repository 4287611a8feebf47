use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::registry::{CancelSignal, cancelled};

use super::config::ExchangeApiConfig;
use super::error::SummaryError;
use super::projection::project;
use super::types::{SummaryRequest, SummaryResponse};

/// Triggers a summary computation on the currency-exchange API, fetches the
/// result and renders it as text.
///
/// The HTTP client is shared; cloning a `reqwest::Client` reuses its pool.
#[derive(Clone)]
pub struct SummaryFetcher {
    client: Client,
    config: ExchangeApiConfig,
}

impl SummaryFetcher {
    pub fn new(client: Client, config: ExchangeApiConfig) -> Self {
        Self { client, config }
    }

    /// Build the shared HTTP client from `config`.
    pub fn build_client(config: &ExchangeApiConfig) -> Result<Client, reqwest::Error> {
        Client::builder()
            .timeout(config.request_timeout())
            .user_agent(&config.user_agent)
            .build()
    }

    pub fn config(&self) -> &ExchangeApiConfig {
        &self.config
    }

    /// Summary text for `request`.
    ///
    /// Conditions handled locally (failed trigger, nothing to show, columns
    /// that do not fit) come back as `Ok` with a user-facing message.
    /// Transport failures, unexpected fetch statuses, undecodable bodies and
    /// cancellation are errors.
    pub async fn get_summary(
        &self,
        request: &SummaryRequest,
        cancel: CancelSignal,
    ) -> Result<String, SummaryError> {
        let uri = self.config.summary_uri(request);

        let retrieved = tokio::select! {
            biased;
            _ = cancelled(cancel) => Err(SummaryError::Cancelled),
            result = self.retrieve(&uri) => result,
        };

        match retrieved.and_then(|response| project(&response)) {
            Ok(text) => Ok(text),
            Err(err) => match err.recovered_text() {
                Some(text) => {
                    info!(uri = %uri, reason = %err, "Returning summary placeholder");
                    Ok(text)
                }
                None => Err(err),
            },
        }
    }

    async fn retrieve(&self, uri: &str) -> Result<SummaryResponse, SummaryError> {
        let trigger = self.client.post(uri).body("").send().await?;
        let status = trigger.status();
        if !status.is_success() {
            warn!(uri = %uri, %status, "Summary trigger rejected");
            return Err(SummaryError::TriggerFailed { status });
        }
        debug!(uri = %uri, %status, "Summary trigger accepted");

        let attempts = self.config.max_attempts();
        let mut delay = self.config.initial_delay();

        for attempt in 1..=attempts {
            tokio::time::sleep(delay).await;

            if let Some(response) = self.fetch(uri, attempt).await? {
                return response.ok_or(SummaryError::FetchEmpty);
            }
            delay = self.config.next_delay(delay);
        }

        Err(SummaryError::NotReady { attempts })
    }

    /// One fetch. `Ok(None)` means the backend has not finished yet.
    async fn fetch(
        &self,
        uri: &str,
        attempt: u32,
    ) -> Result<Option<Option<SummaryResponse>>, SummaryError> {
        let response = self.client.get(uri).send().await?;
        let status = response.status();

        if is_not_ready(status) {
            debug!(uri = %uri, %status, attempt, "Summary not ready yet");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SummaryError::FetchStatus { status });
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(None));
        }
        let decoded: Option<SummaryResponse> = serde_json::from_slice(&body)?;
        debug!(uri = %uri, attempt, entries = decoded.as_ref().map_or(0, |r| r.entries.len()), "Summary fetched");
        Ok(Some(decoded))
    }
}

/// Statuses the fetch endpoint uses while the summary is still being computed.
fn is_not_ready(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::ACCEPTED | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND
    )
}

/// Delays that are walked one by one before the rest of the schedule is
/// treated as flat.
const BUDGET_STEPS: u32 = 64;

/// Upper bound on how long one [`SummaryFetcher::get_summary`] may wait
/// between fetches in total, ignoring request time.
///
/// Only the first [`BUDGET_STEPS`] delays are walked, so this stays cheap for
/// any `max_attempts`. The remaining attempts are counted at the settled
/// delay, or at `max_delay_ms` if backoff is still growing.
pub fn total_poll_budget(config: &ExchangeApiConfig) -> Duration {
    let attempts = config.max_attempts();
    let mut delay = config.initial_delay();
    let mut total = Duration::ZERO;

    for walked in 0..attempts.min(BUDGET_STEPS) {
        total = total.saturating_add(delay);
        let next = config.next_delay(delay);
        let remaining = attempts - walked - 1;
        if next == delay || walked + 1 == BUDGET_STEPS {
            let flat = if next == delay {
                delay
            } else {
                Duration::from_millis(config.max_delay_ms)
            };
            let rest = flat.checked_mul(remaining).unwrap_or(Duration::MAX);
            return total.saturating_add(rest);
        }
        delay = next;
    }
    total
}
