//! Resolution of parsed notations through a vault client

use crate::error::ResolveError;
use crate::notation::{FieldCategory, NotationReference};
use crate::vault::{SecretsManagerOptions, VaultClient};

/// Resolves notation references to their secret values
///
/// Calls block on the vault client; run them on a worker thread when the
/// caller must not wait.
pub struct ReferenceResolver<'a, C: VaultClient + ?Sized> {
    client: &'a C,
    options: &'a SecretsManagerOptions,
}

impl<'a, C: VaultClient + ?Sized> ReferenceResolver<'a, C> {
    /// Create a resolver backed by `client`
    pub fn new(client: &'a C, options: &'a SecretsManagerOptions) -> Self {
        Self { client, options }
    }

    /// Resolve a reference, memoizing the value on it
    ///
    /// A reference that already carries a value is answered without
    /// contacting the vault.
    pub fn resolve(&self, reference: &mut NotationReference) -> Result<String, ResolveError> {
        if let Some(value) = reference.resolved_value() {
            tracing::debug!(uid = reference.record_uid(), "Using memoized secret value");
            return Ok(value.to_string());
        }

        tracing::debug!(
            uid = reference.record_uid(),
            category = %reference.field_category(),
            "Resolving secret"
        );

        let records = self
            .client
            .fetch_records(self.options, &[reference.record_uid()])?;

        let value = match reference.field_category() {
            // Attachments are assumed to be text, such as a private key
            FieldCategory::File => {
                let file = self.client.locate_file(&records, reference.raw_notation())?;
                let bytes = self.client.download_file(&file)?;
                String::from_utf8(bytes).map_err(|source| ResolveError::InvalidUtf8 {
                    file: file.name.clone(),
                    source,
                })?
            }
            FieldCategory::Field | FieldCategory::CustomField => self
                .client
                .get_value(&records, reference.raw_notation())?,
        };

        Ok(reference.memoize(value).to_string())
    }
}
