//! MCP server for SavingsOnDapr.
//!
//! Offers two tools over JSON-RPC 2.0 (STDIO and/or HTTP): `echo` and
//! `get_currency_exchange_summary`, which asks the currency-exchange API to
//! compute a summary, reads it back, and formats it as text.

pub mod core;
pub mod exchange;
pub mod tools;
