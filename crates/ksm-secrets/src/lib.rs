//! Cached, asynchronous Keeper secret retrieval
//!
//! Builds on [`ksm_notation`] with the pieces a host application needs:
//!
//! - [`KsmConfig`]: connection settings from `config.toml` and `KEEPER_*` env vars
//! - [`SecretCache`]: per-notation cache with a fixed time-to-live and a single
//!   in-flight lookup per key
//! - [`KsmSecretService`]: parses a notation, then resolves it on the blocking
//!   pool behind the cache
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ksm_notation::LocalVault;
//! use ksm_secrets::{KsmConfig, KsmSecretService, VaultSecretService};
//!
//! let config = KsmConfig::load_default()?.resolve()?;
//! let vault = Arc::new(LocalVault::open("records.json")?);
//! let service = KsmSecretService::from_config(vault, config);
//!
//! let password = service.get_value("keeper://Kr3dO0RXfAbbwkGvPXgQpw/field/password").await?;
//! ```

mod cache;
mod config;
mod error;
mod service;

pub use cache::{SecretCache, SharedSecret};
pub use config::{
    ConfigProvider, KsmConfig, ResolvedConfig, DEFAULT_CACHE_TTL_MS, DEFAULT_SERVER_PUBLIC_KEY_ID,
};
pub use error::{ConfigError, SecretError};
pub use service::{KsmSecretService, VaultSecretService};
