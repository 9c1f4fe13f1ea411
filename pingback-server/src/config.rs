//! Configuration for the pingback server.
//!
//! ```json
//! {
//!   "port": 8080,
//!   "path": "/pingback",
//!   "gateway": {
//!     "private_key": "$FASTERPAY_PRIVATE_KEY",
//!     "public_key": "$FASTERPAY_PUBLIC_KEY",
//!     "environment": "sandbox"
//!   }
//! }
//! ```

use clap::Parser;
use fasterpay_axum::DEFAULT_BODY_LIMIT;
use fasterpay_types::config::GatewayConfig;
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use crate::handlers::HEALTH_PATH;

/// CLI arguments for the pingback server.
#[derive(Parser, Debug)]
#[command(name = "fasterpay-pingback")]
#[command(about = "FasterPay pingback receiver")]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// Server configuration.
///
/// `host` and `port` fall back to `$HOST` / `$PORT`, then to `0.0.0.0:8080`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    #[serde(default = "config_defaults::default_path")]
    path: String,
    #[serde(default = "config_defaults::default_body_limit")]
    body_limit: usize,
    gateway: GatewayConfig,
}

pub mod config_defaults {
    use std::env;
    use std::net::{IpAddr, Ipv4Addr};

    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    pub const DEFAULT_PATH: &str = "/pingback";

    /// $PORT, else 8080
    pub fn default_port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// $HOST, else 0.0.0.0
    pub fn default_host() -> IpAddr {
        env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HOST)
    }

    pub fn default_path() -> String {
        DEFAULT_PATH.to_string()
    }

    pub fn default_body_limit() -> usize {
        super::DEFAULT_BODY_LIMIT
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error(
        "Invalid pingback path {0:?}: must start with '/', contain no '{{' or '}}', and not be /health"
    )]
    InvalidPath(String),
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    /// Route the gateway posts pingbacks to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Largest pingback body accepted, in bytes.
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    pub fn gateway(&self) -> &GatewayConfig {
        &self.gateway
    }

    /// Load configuration from the `--config <path>` CLI argument (or `$CONFIG`,
    /// default `./config.json`).
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        let config_path = Path::new(&cli_args.config)
            .canonicalize()
            .map_err(|e| ConfigError::FileRead(cli_args.config, e))?;
        Self::load_from_path(config_path)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        Self::from_json(&content)
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        if !config.path.starts_with('/')
            || config.path == HEALTH_PATH
            || config.path.contains(['{', '}'])
        {
            return Err(ConfigError::InvalidPath(config.path));
        }
        Ok(config)
    }
}
