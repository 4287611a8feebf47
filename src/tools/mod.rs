/// Tools Module
///
/// Each tool lives in its own module and exports a `register` function that
/// adds it to the registry during server initialization.

pub mod currency_exchange;
pub mod echo;

use std::sync::Arc;

use crate::core::error::ServerError;
use crate::core::registry::ToolRegistry;
use crate::core::utils::ConfigFile;
use crate::exchange::{ExchangeApiConfig, SummaryFetcher};

/// Build the registry with every tool this server offers.
///
/// `lookup` supplies environment overrides for tool settings.
pub fn build_registry(
    config: &ConfigFile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<ToolRegistry>, ServerError> {
    let exchange_config = config
        .tool_config::<ExchangeApiConfig>(currency_exchange::CONFIG_SECTION)?
        .apply_env_overrides(lookup)?;
    let client = SummaryFetcher::build_client(&exchange_config)?;

    let mut registry = ToolRegistry::new();
    echo::register(&mut registry);
    currency_exchange::register(&mut registry, SummaryFetcher::new(client, exchange_config));

    Ok(Arc::new(registry))
}
