//! Cached, asynchronous secret retrieval by notation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use ksm_notation::{NotationReference, ReferenceResolver, SecretsManagerOptions, VaultClient};

use crate::cache::{SecretCache, SharedSecret};
use crate::config::ResolvedConfig;
use crate::error::SecretError;

/// A service resolving secret names to values
#[async_trait]
pub trait VaultSecretService: Send + Sync {
    /// Canonical form of a secret name, used as its cache key
    fn canonicalize(&self, name: &str) -> String;

    /// Retrieve the value of the named secret
    async fn get_value(&self, name: &str) -> Result<String, Arc<SecretError>>;
}

/// Keeper secret service
///
/// Lookups run on Tokio's blocking pool and are cached per notation for a
/// fixed time-to-live. Must be used from within a Tokio runtime.
pub struct KsmSecretService {
    client: Arc<dyn VaultClient>,
    options: Arc<SecretsManagerOptions>,
    cache: SecretCache,
}

impl KsmSecretService {
    /// Create a service backed by `client`
    pub fn new(
        client: Arc<dyn VaultClient>,
        options: SecretsManagerOptions,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            options: Arc::new(options),
            cache: SecretCache::new(ttl),
        }
    }

    /// Create a service from resolved configuration
    pub fn from_config(client: Arc<dyn VaultClient>, config: ResolvedConfig) -> Self {
        Self::new(client, config.options, config.cache_ttl)
    }

    pub fn cache(&self) -> &SecretCache {
        &self.cache
    }

    /// Start or join the lookup for `name` without waiting for it
    ///
    /// The notation is validated immediately, so grammar errors are returned
    /// here and never cached. Dropping the returned handle does not cancel
    /// the lookup.
    pub fn request(&self, name: &str) -> Result<SharedSecret, SecretError> {
        let reference = NotationReference::parse(name)?;
        let key = self.canonicalize(name);
        Ok(self.cache.get_or_refresh(&key, || self.refresh(reference)))
    }

    /// Spawn a blocking lookup of `reference`
    fn refresh(
        &self,
        mut reference: NotationReference,
    ) -> BoxFuture<'static, Result<String, SecretError>> {
        let client = Arc::clone(&self.client);
        let options = Arc::clone(&self.options);

        let handle = tokio::task::spawn_blocking(move || {
            ReferenceResolver::new(client.as_ref(), &options).resolve(&mut reference)
        });

        async move {
            match handle.await {
                Ok(result) => result.map_err(SecretError::from),
                Err(e) => Err(SecretError::Task(e.to_string())),
            }
        }
        .boxed()
    }
}

#[async_trait]
impl VaultSecretService for KsmSecretService {
    fn canonicalize(&self, name: &str) -> String {
        name.to_string()
    }

    async fn get_value(&self, name: &str) -> Result<String, Arc<SecretError>> {
        let pending = self.request(name).map_err(Arc::new)?;
        pending.await
    }
}
