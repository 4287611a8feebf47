/// Utility Functions for Configuration, Environment, and Logging
///
/// Configuration comes from two places: environment variables for the server
/// itself (name, transport, bind address) and an optional YAML file with a
/// `tools` section holding tool-specific settings:
///
/// ```yaml
/// tools:
///   currency_exchange:
///     base_url: "http://localhost"
///     port: 5170
/// ```

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use crate::core::error::ConfigError;

/// Default path of the YAML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "kmcp.yaml";

/// Transport(s) the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Stdio,
    Http,
    Both,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "both" => Ok(Self::Both),
            other => Err(ConfigError::Env {
                key: "MCP_TRANSPORT_MODE".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Server-level settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub name: String,
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    /// HTTP worker threads; `None` means CPU count capped at 16.
    pub workers: Option<usize>,
    pub config_path: String,
}

impl ServerSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let transport = get("MCP_TRANSPORT_MODE", "both").parse()?;
        let port = parse_var("PORT", &get("PORT", "3000"))?;
        let workers = lookup("WORKER_THREADS")
            .map(|v| parse_var::<usize>("WORKER_THREADS", &v))
            .transpose()?;

        Ok(Self {
            name: get("SERVER_NAME", "savings-mcp-server"),
            version: get("SERVER_VERSION", env!("CARGO_PKG_VERSION")),
            transport,
            host: get("HOST", "0.0.0.0"),
            port,
            workers,
            config_path: get("MCP_CONFIG", DEFAULT_CONFIG_PATH),
        })
    }

    /// Worker thread count for the HTTP transport.
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| num_cpus::get().min(16))
            .max(1)
    }
}

/// Parse an environment value, naming the variable on failure.
pub fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Contents of the YAML configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Tool name -> tool-specific settings
    #[serde(default)]
    pub tools: HashMap<String, Value>,
}

impl ConfigFile {
    pub fn from_yaml_str(source: &str, path: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not a map.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Settings for `tool_name`, or `T::default()` when the file has no
    /// section for it.
    pub fn tool_config<T>(&self, tool_name: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        match self.tools.get(tool_name) {
            Some(section) if !section.is_null() => {
                serde_json::from_value(section.clone()).map_err(|source| ConfigError::Tool {
                    tool: tool_name.to_string(),
                    source,
                })
            }
            _ => Ok(T::default()),
        }
    }
}

/// Load configuration from a YAML file.
///
/// A missing file yields an empty configuration so every tool falls back to
/// its defaults. A file that exists but cannot be read or parsed is an error.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigFile, ConfigError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    match std::fs::read_to_string(path) {
        Ok(source) => ConfigFile::from_yaml_str(&source, &shown),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %shown, "No config file found, using defaults");
            Ok(ConfigFile::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: shown,
            source,
        }),
    }
}

/// Get environment variable value with a default fallback.
pub fn get_env_var(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Install the global tracing subscriber.
///
/// Output always goes to stderr so the STDIO transport keeps stdout for
/// JSON-RPC. `RUST_LOG` controls the filter (default `info`) and
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if get_env_var("LOG_FORMAT", "text") == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
