//! Configuration management for the acct-mgt API
//!
//! This module provides a centralized configuration system that loads settings from:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML format)
//! 3. Default values (lowest priority)
//!
//! The configuration is built once at startup and shared by every request.

use crate::kubernetes::credentials::TokenSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration struct for acct-mgt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcctMgtConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// Cluster API connection
    pub cluster: ClusterConfig,
    /// Identity defaults for composite users
    pub identity: IdentityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

/// Which implementation of the cluster API to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The cluster's REST API
    #[default]
    Rest,
    /// An in-process emulation, state is lost on exit
    Memory,
}

/// Cluster API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub backend: BackendKind,
    /// Base URL of the API server; a bare host means HTTPS
    pub api_url: String,
    /// Service account token file, re-read on every call
    pub token_path: PathBuf,
    /// Fixed token, takes precedence over `token_path`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Skip verification of the API server's certificate
    pub insecure_skip_tls_verify: bool,
    /// Per-request timeout; unset means no timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Identity defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Provider used when a request names none
    pub default_provider: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Write daily-rotated log files here in addition to stdout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable output
    pub json_format: bool,
}

pub const DEFAULT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Rest,
            api_url: String::new(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            token: None,
            insecure_skip_tls_verify: false,
            request_timeout_secs: None,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_provider: "sso_auth".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            json_format: false,
        }
    }
}

impl ClusterConfig {
    /// Where the bearer token for cluster calls comes from
    pub fn token_source(&self) -> TokenSource {
        match &self.token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::File(self.token_path.clone()),
        }
    }
}

impl AcctMgtConfig {
    /// Load configuration from the config file (if any) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Environment variable override
            std::env::var("ACCT_MGT_CONFIG").ok().map(PathBuf::from),
            // Standard locations
            Some(PathBuf::from("/etc/acct-mgt/config.toml")),
            Some(PathBuf::from("./acct-mgt.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply overrides from `lookup`, normally the process environment
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("ACCT_MGT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ACCT_MGT_PORT") {
            self.server.port = parse_var("ACCT_MGT_PORT", &port)?;
        }

        // Cluster; the unprefixed name is what older deployments set
        if let Some(url) = lookup("openshift_url") {
            self.cluster.api_url = url;
        }
        if let Some(url) = lookup("ACCT_MGT_CLUSTER_URL") {
            self.cluster.api_url = url;
        }
        if let Some(path) = lookup("ACCT_MGT_TOKEN_PATH") {
            self.cluster.token_path = PathBuf::from(path);
        }
        if let Some(insecure) = lookup("ACCT_MGT_TLS_INSECURE") {
            self.cluster.insecure_skip_tls_verify = parse_var("ACCT_MGT_TLS_INSECURE", &insecure)?;
        }
        if let Some(secs) = lookup("ACCT_MGT_REQUEST_TIMEOUT_SECS") {
            self.cluster.request_timeout_secs =
                Some(parse_var("ACCT_MGT_REQUEST_TIMEOUT_SECS", &secs)?);
        }
        if let Some(backend) = lookup("ACCT_MGT_BACKEND") {
            self.cluster.backend = match backend.to_ascii_lowercase().as_str() {
                "rest" => BackendKind::Rest,
                "memory" => BackendKind::Memory,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "ACCT_MGT_BACKEND".to_string(),
                        value: backend,
                    })
                }
            };
        }

        // Identity
        if let Some(provider) = lookup("ACCT_MGT_IDENTITY_PROVIDER") {
            self.identity.default_provider = provider;
        }

        // Logging
        if let Some(level) = lookup("ACCT_MGT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("ACCT_MGT_LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(json) = lookup("ACCT_MGT_JSON_LOGS") {
            self.logging.json_format = parse_var("ACCT_MGT_JSON_LOGS", &json)?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port cannot be 0".to_string()));
        }

        if self.cluster.backend == BackendKind::Rest && self.cluster.api_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cluster API URL is not set (ACCT_MGT_CLUSTER_URL or openshift_url)".to_string(),
            ));
        }

        if self.identity.default_provider.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default identity provider cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Address to bind the HTTP listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("config validation failed: {0}")]
    Validation(String),
}
