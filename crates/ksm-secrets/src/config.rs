//! Connection configuration with environment variable priority
//!
//! Configuration is resolved in this order (first found wins):
//! 1. Environment variables (KEEPER_*)
//! 2. Config file (`~/.config/ksm/config.toml` by default)
//! 3. Default values (where applicable)
//!
//! An empty value counts as unset, so `KEEPER_HOSTNAME=""` falls through to
//! the config file.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ksm_notation::SecretsManagerOptions;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable prefix
const ENV_PREFIX: &str = "KEEPER";

/// Default server public key id
pub const DEFAULT_SERVER_PUBLIC_KEY_ID: u32 = 10;

/// Default time a resolved secret stays cached
pub const DEFAULT_CACHE_TTL_MS: u64 = 5000;

/// Configuration as read from TOML, overridable by env
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct KsmConfig {
    /// Application client id
    #[serde(alias = "clientId")]
    pub client_id: Option<String>,

    /// Client private key
    #[serde(alias = "privateKey")]
    pub private_key: Option<String>,

    /// Application key
    #[serde(alias = "appKey")]
    pub app_key: Option<String>,

    /// Vault hostname (e.g., "keepersecurity.com")
    pub hostname: Option<String>,

    /// Id of the server public key to encrypt with
    #[serde(alias = "serverpublickeyid")]
    pub server_public_key_id: Option<u32>,

    /// Skip TLS certificate verification
    #[serde(alias = "allowUnverifiedCertificate")]
    pub allow_unverified_certificate: Option<bool>,

    /// Cache time-to-live in milliseconds
    pub cache_ttl_ms: Option<u64>,

    /// Local JSON records file served instead of a remote vault
    pub records_file: Option<PathBuf>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub options: SecretsManagerOptions,
    pub cache_ttl: Duration,
    pub records_file: Option<PathBuf>,
}

/// Get the env variable name for a config key
fn env_name(key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, key.to_ascii_uppercase())
}

/// Looks up values in the environment first, then in the config file
pub struct ConfigProvider<F> {
    env: F,
}

impl<F> ConfigProvider<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(env: F) -> Self {
        Self { env }
    }

    /// Get a value that must be present
    pub fn get_required(
        &self,
        key: &'static str,
        file_value: Option<String>,
    ) -> Result<String, ConfigError> {
        (self.env)(&env_name(key))
            .filter(|v| !v.is_empty())
            .or(file_value.filter(|v| !v.is_empty()))
            .ok_or_else(|| ConfigError::Missing {
                key,
                env: env_name(key),
            })
    }

    /// Get a value, falling back to `default`
    pub fn get_optional<T>(
        &self,
        key: &'static str,
        file_value: Option<T>,
        default: T,
    ) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.env)(&env_name(key)) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
            None => Ok(file_value.unwrap_or(default)),
        }
    }
}

impl KsmConfig {
    /// Get the default config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ksm")
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using environment only", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&Self::default_path())
    }

    /// Resolve configuration from environment variables first, then config file
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        self.resolve_with(|name| env::var(name).ok())
    }

    /// Resolve using a custom environment lookup
    pub fn resolve_with<F>(self, env: F) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = ConfigProvider::new(env);

        let options = SecretsManagerOptions {
            client_id: provider.get_required("client_id", self.client_id)?,
            private_key: provider.get_required("private_key", self.private_key)?,
            app_key: provider.get_required("app_key", self.app_key)?,
            hostname: provider.get_required("hostname", self.hostname)?,
            server_public_key_id: provider.get_optional(
                "server_public_key_id",
                self.server_public_key_id,
                DEFAULT_SERVER_PUBLIC_KEY_ID,
            )?,
            allow_unverified_certificate: provider.get_optional(
                "allow_unverified_certificate",
                self.allow_unverified_certificate,
                false,
            )?,
        };

        let cache_ttl_ms =
            provider.get_optional("cache_ttl_ms", self.cache_ttl_ms, DEFAULT_CACHE_TTL_MS)?;

        let records_file = (provider.env)(&env_name("records_file"))
            .map(PathBuf::from)
            .or(self.records_file);

        if options.allow_unverified_certificate {
            tracing::warn!("TLS certificate verification is disabled for {}", options.hostname);
        }

        Ok(ResolvedConfig {
            options,
            cache_ttl: Duration::from_millis(cache_ttl_ms),
            records_file,
        })
    }
}
