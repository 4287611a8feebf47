#![allow(dead_code)]

use savings_mcp_server::exchange::{ExchangeApiConfig, SummaryFetcher, SummaryRequest};
use serde_json::{Value, json};
use tokio::sync::watch;
use wiremock::MockServer;

pub const SUMMARY_PATH: &str = "/api/currency-exchange-summary/USD/EUR/2024-01-01";

/// Backend settings pointing at `mock_server` with short delays.
pub fn config_for(mock_server: &MockServer) -> ExchangeApiConfig {
    ExchangeApiConfig {
        base_url: "http://127.0.0.1".to_string(),
        port: mock_server.address().port(),
        request_timeout_ms: 5_000,
        initial_delay_ms: 1,
        max_attempts: 3,
        backoff_multiplier: 2.0,
        max_delay_ms: 10,
        ..Default::default()
    }
}

pub fn fetcher_with(config: ExchangeApiConfig) -> SummaryFetcher {
    let client = SummaryFetcher::build_client(&config).unwrap();
    SummaryFetcher::new(client, config)
}

pub fn fetcher_for(mock_server: &MockServer) -> SummaryFetcher {
    fetcher_with(config_for(mock_server))
}

pub fn usd_eur(end_date: Option<&str>) -> SummaryRequest {
    SummaryRequest {
        source_currency: "USD".to_string(),
        target_currency: "EUR".to_string(),
        start_date: "2024-01-01".to_string(),
        end_date: end_date.map(str::to_string),
    }
}

/// Cancellation signal that never fires while the sender is alive.
pub fn never_cancelled() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

pub fn summary_body(columns: &[&str], rows: &[&[&str]]) -> Value {
    json!({
        "ResponseKey": "USD-EUR-2024-01-01",
        "ColumnNames": columns,
        "Entries": rows
            .iter()
            .enumerate()
            .map(|(i, row)| json!({ "EntryName": format!("day-{i}"), "ColumnValues": row }))
            .collect::<Vec<_>>(),
    })
}

pub const STANDARD_COLUMNS: [&str; 3] = ["Date", "TotalExchangesCount", "TotalSourceAmount"];

/// Count requests `mock_server` received with the given method.
pub async fn count_requests(mock_server: &MockServer, http_method: &str) -> usize {
    mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == http_method)
        .count()
}
