//! Configuration handling for the probe.
//!
//! Values come from the `client:` section of a YAML file and are then
//! overridden by `HXNET_*` environment variables.

use anyhow::{Context, Result};
use hxnet_session::{TransportConfig, DEFAULT_POOL_SIZE, DEFAULT_USER_AGENT};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Whether to use HTTPS
    pub ssl: bool,
    /// Request path every URI is built on
    pub path: String,
    /// Shared secret mixed into `cmd_id`
    pub salt: String,
    /// Client version sent as `app_version`, if set
    pub version: String,
    /// User-Agent header
    pub user_agent: String,
    /// Timeout for one exchange
    pub timeout: Duration,
    /// Number of pooled connections
    pub pool_size: usize,
    /// Session token for session-tier requests
    pub session_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 443,
            ssl: true,
            path: "/index.php".to_string(),
            salt: String::new(),
            version: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            pool_size: DEFAULT_POOL_SIZE,
            session_id: None,
        }
    }
}

/// Root configuration structure (matches the YAML structure)
#[derive(Debug, Deserialize)]
struct RootConfig {
    client: Option<FileConfig>,
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    ssl: Option<bool>,
    path: Option<String>,
    salt: Option<String>,
    version: Option<String>,
    user_agent: Option<String>,
    timeout: Option<String>,
    pool_size: Option<usize>,
    credentials: Option<Credentials>,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    session_id: Option<String>,
}

impl ClientConfig {
    /// Load configuration from file and environment variables
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    fn load_with_env<P: AsRef<Path>>(
        config_path: P,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::default();

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match serde_yaml::from_str::<RootConfig>(&content) {
                Ok(root) => {
                    if let Some(file) = root.client {
                        config.apply_file_config(file)?;
                    }
                    info!("Loaded configuration from {:?}", config_path.as_ref());
                }
                Err(e) => warn!(
                    "Failed to parse config file {:?} ({}), using defaults",
                    config_path.as_ref(),
                    e
                ),
            },
            Err(_) => warn!(
                "Config file {:?} not found, using defaults",
                config_path.as_ref()
            ),
        }

        config.apply_environment_overrides(var);

        info!(
            "Final client configuration: host={}, port={}, ssl={}, path={}, pool_size={}",
            config.host, config.port, config.ssl, config.path, config.pool_size
        );

        Ok(config)
    }

    fn apply_file_config(&mut self, file: FileConfig) -> Result<()> {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(ssl) = file.ssl {
            self.ssl = ssl;
        }
        if let Some(path) = file.path {
            self.path = path;
        }
        if let Some(salt) = file.salt {
            self.salt = salt;
        }
        if let Some(version) = file.version {
            self.version = version;
        }
        if let Some(user_agent) = file.user_agent {
            self.user_agent = user_agent;
        }
        if let Some(timeout) = file.timeout {
            self.timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("invalid timeout {:?}", timeout))?;
        }
        if let Some(pool_size) = file.pool_size {
            self.pool_size = pool_size;
        }
        if let Some(credentials) = file.credentials {
            self.session_id = credentials.session_id;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_environment_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("HXNET_HOST") {
            info!("Host overridden by environment: {}", host);
            self.host = host;
        }

        if let Some(port) = var("HXNET_PORT") {
            match port.parse::<u16>() {
                Ok(port) => {
                    self.port = port;
                    info!("Port overridden by environment: {}", port);
                }
                Err(_) => warn!("Ignoring invalid HXNET_PORT {:?}", port),
            }
        }

        if let Some(ssl) = var("HXNET_SSL") {
            self.ssl = ssl.eq_ignore_ascii_case("true") || ssl == "1";
            info!("SSL overridden by environment: {}", self.ssl);
        }

        if let Some(salt) = var("HXNET_SALT") {
            self.salt = salt;
            info!("Salt overridden by environment");
        }

        if let Some(session_id) = var("HXNET_SESSION_ID") {
            self.session_id = Some(session_id);
            info!("Session id overridden by environment");
        }
    }

    /// Transport settings derived from this configuration
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            host: self.host.clone(),
            port: self.port,
            ssl: self.ssl,
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
            pool_size: self.pool_size,
        }
    }
}
