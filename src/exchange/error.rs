use reqwest::StatusCode;
use thiserror::Error;

/// Text returned whenever there is nothing to show.
pub const NO_DATA_MESSAGE: &str = "No data available";

/// Prefix of the text returned for a response that does not fit the expected
/// columns.
pub const MALFORMED_PREFIX: &str = "Malformed data: ";

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("trigger call returned {status}")]
    TriggerFailed { status: StatusCode },

    #[error("fetch returned no entries")]
    FetchEmpty,

    #[error("summary not ready after {attempts} fetch attempts")]
    NotReady { attempts: u32 },

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("entry '{entry}' has {found} values, expected at least {expected}")]
    ShortEntry {
        entry: String,
        found: usize,
        expected: usize,
    },

    #[error("currency exchange API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("currency exchange API fetch returned {status}")]
    FetchStatus { status: StatusCode },

    #[error("invalid summary response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cancelled")]
    Cancelled,
}

impl SummaryError {
    /// Text shown to the caller for conditions handled locally, or `None`
    /// when the error must fail the call.
    pub fn recovered_text(&self) -> Option<String> {
        match self {
            Self::TriggerFailed { .. } | Self::FetchEmpty | Self::NotReady { .. } => {
                Some(NO_DATA_MESSAGE.to_string())
            }
            Self::MissingColumn(_) | Self::ShortEntry { .. } => {
                Some(format!("{}{}", MALFORMED_PREFIX, self))
            }
            Self::Transport(_) | Self::FetchStatus { .. } | Self::Decode(_) | Self::Cancelled => None,
        }
    }
}
