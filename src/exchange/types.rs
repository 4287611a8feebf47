//! Request parameters and the wire shape of the summary response.

use serde::Deserialize;

/// Parameters of one summary lookup, as supplied by the MCP client.
///
/// Dates are expected as `yyyy-MM-dd` but are not validated here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub source_currency: String,
    pub target_currency: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Result computed by the backend. Each entry's `column_values` are
/// positionally aligned with `column_names`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SummaryResponse {
    pub response_key: String,
    pub column_names: Vec<String>,
    pub entries: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SummaryEntry {
    pub entry_name: String,
    pub column_values: Vec<String>,
}
