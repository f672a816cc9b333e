use thiserror::Error;

use ksm_notation::{NotationError, ResolveError};

/// Errors surfaced by the secret service
#[derive(Debug, Error)]
pub enum SecretError {
    /// Notation failed to parse
    #[error("Invalid notation: {0}")]
    Notation(#[from] NotationError),

    /// Vault lookup failed
    #[error("Failed to resolve secret: {0}")]
    Resolve(#[from] ResolveError),

    /// Connection configuration is incomplete or invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker running the lookup panicked or was cancelled
    #[error("Secret lookup task failed: {0}")]
    Task(String),
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required value absent from both the environment and the config file
    #[error("{key} is required. Set {env} or {key} in config")]
    Missing { key: &'static str, env: String },

    /// Value present but not parsable
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// Config file exists but could not be read
    #[error("Failed to read config file '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
