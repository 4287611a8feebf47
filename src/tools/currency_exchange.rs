/// Currency Exchange Summary Tool
///
/// Exposes [`SummaryFetcher::get_summary`] as the
/// `get_currency_exchange_summary` MCP tool. Settings come from the
/// `currency_exchange` section of the config file.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::core::error::{ToolError, ToolResult};
use crate::core::registry::{CancelSignal, MCPTool, Tool, ToolRegistry};
use crate::exchange::fetcher::total_poll_budget;
use crate::exchange::{SummaryError, SummaryFetcher, SummaryRequest};

pub const NAME: &str = "get_currency_exchange_summary";

/// Config file section holding [`crate::exchange::ExchangeApiConfig`].
pub const CONFIG_SECTION: &str = "currency_exchange";

pub struct CurrencyExchangeTool {
    fetcher: SummaryFetcher,
}

impl CurrencyExchangeTool {
    pub fn new(fetcher: SummaryFetcher) -> Self {
        Self { fetcher }
    }
}

/// Register the currency-exchange summary tool with the tool registry.
///
/// # Arguments
/// * `registry` - The tool registry to register with
/// * `fetcher` - Client for the currency-exchange API, already configured
pub fn register(registry: &mut ToolRegistry, fetcher: SummaryFetcher) {
    let config = fetcher.config();
    let poll_budget_ms = u64::try_from(total_poll_budget(config).as_millis()).unwrap_or(u64::MAX);
    info!(
        base_url = %config.base_url,
        port = config.port,
        max_attempts = config.max_attempts(),
        poll_budget_ms,
        "Currency exchange API configured"
    );
    registry.register(Arc::new(CurrencyExchangeTool::new(fetcher)));
}

fn parse_request(args: Value) -> ToolResult<SummaryRequest> {
    let request: SummaryRequest =
        serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

    for (field, value) in [
        ("sourceCurrency", &request.source_currency),
        ("targetCurrency", &request.target_currency),
        ("startDate", &request.start_date),
    ] {
        if value.trim().is_empty() {
            return Err(ToolError::InvalidArguments(format!("{field} must not be empty")));
        }
    }
    Ok(request)
}

#[async_trait]
impl Tool for CurrencyExchangeTool {
    fn definition(&self) -> MCPTool {
        MCPTool {
            name: NAME.to_string(),
            description: "Retrieves statistics about Currency Exchange transactions in the SavingsOnDapr system.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sourceCurrency": {
                        "type": "string",
                        "description": "The source currency"
                    },
                    "targetCurrency": {
                        "type": "string",
                        "description": "The target currency"
                    },
                    "startDate": {
                        "type": "string",
                        "description": "The start date of summary (yyyy-MM-dd format)"
                    },
                    "endDate": {
                        "type": "string",
                        "description": "The end date of summary, optional (yyyy-MM-dd format)"
                    }
                },
                "required": ["sourceCurrency", "targetCurrency", "startDate"]
            }),
        }
    }

    async fn call(&self, args: Value, cancel: CancelSignal) -> ToolResult<Value> {
        let request = parse_request(args)?;

        match self.fetcher.get_summary(&request, cancel).await {
            Ok(text) => Ok(Value::String(text)),
            Err(SummaryError::Cancelled) => Err(ToolError::Cancelled),
            Err(e) => Err(ToolError::ExecutionFailed(e.to_string())),
        }
    }
}
