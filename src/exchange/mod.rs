//! Currency-exchange summary retrieval.
//!
//! A summary is obtained in two calls against the same resource: a `POST`
//! that asks the backend to compute it, then a `GET` that reads the result.
//! The result is a column-oriented table which [`projection::project`] turns
//! into labelled text lines.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod projection;
pub mod types;

pub use config::ExchangeApiConfig;
pub use error::{MALFORMED_PREFIX, NO_DATA_MESSAGE, SummaryError};
pub use fetcher::SummaryFetcher;
pub use types::{SummaryEntry, SummaryRequest, SummaryResponse};
