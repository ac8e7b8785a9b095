use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::TlpLabel;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Advisory document tree
    pub documents: DocumentsConfig,

    /// Credentials and the labels they unlock
    #[serde(default)]
    pub auth: Vec<AuthEntry>,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the
    /// environment. `path` (from the CLI) wins over `CONFIG_PATH`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let config_path = path
            .map(str::to_string)
            .or_else(|| std::env::var("CONFIG_PATH").ok());

        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ));

        // Override with config file if it exists
        if let Some(config_path) = config_path {
            builder = builder.add_source(config::File::with_name(&config_path).required(false));
        }

        builder
            // Override with environment variables (prefix: ADVISORY_API)
            .add_source(
                config::Environment::with_prefix("ADVISORY_API")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Root of the advisory document tree
    #[serde(default = "default_documents_path")]
    pub path: PathBuf,
}

/// One caller credential. WHITE is always implicitly granted; the entry
/// lists the additional labels the token has clearance for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEntry {
    /// The bearer token, without the "Bearer " prefix
    pub token: String,

    /// Labels this token unlocks beyond WHITE
    #[serde(default)]
    pub allowed_tlp_labels: Vec<TlpLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_documents_path() -> PathBuf {
    PathBuf::from("/var/www")
}

fn default_log_level() -> String {
    "info".to_string()
}
