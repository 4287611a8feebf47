/// Core Server Framework Module
///
/// - error.rs: tool, configuration, and startup error types
/// - registry.rs: the `Tool` trait and the registry tools are added to
/// - server.rs: MCP dispatcher plus HTTP and STDIO transports
/// - shutdown.rs: shutdown signal fan-out
/// - utils.rs: configuration, environment, and logging helpers

pub mod error;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod utils;
