//! Local records file backend
//!
//! Serves records from a JSON file shaped like a vault export:
//!
//! ```json
//! { "records": [ { "recordUid": "...", "fields": [...], "files": [ { "fileUid": "...", "name": "...", "data": "<base64>" } ] } ] }
//! ```
//!
//! Useful for offline development and tests; no network access is made.

use std::path::{Path, PathBuf};

use crate::error::VaultError;
use crate::vault::{KeeperFile, RecordSet, SecretsManagerOptions, VaultClient};

/// Vault client reading records from a local JSON file
#[derive(Debug, Clone)]
pub struct LocalVault {
    path: PathBuf,
    records: RecordSet,
}

impl LocalVault {
    /// Load records from `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VaultError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let records: RecordSet = serde_json::from_str(&content).map_err(|e| {
            VaultError::InvalidRecord(format!("Failed to parse '{}': {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            records = records.records.len(),
            "Loaded local records"
        );

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// File the records were loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VaultClient for LocalVault {
    fn fetch_records(
        &self,
        options: &SecretsManagerOptions,
        uids: &[&str],
    ) -> Result<RecordSet, VaultError> {
        tracing::debug!(hostname = %options.hostname, ?uids, "Fetching local records");

        let records = self
            .records
            .records
            .iter()
            .filter(|r| uids.contains(&r.record_uid.as_str()))
            .cloned()
            .collect();
        Ok(RecordSet { records })
    }

    fn download_file(&self, file: &KeeperFile) -> Result<Vec<u8>, VaultError> {
        let data = file.data.as_deref().ok_or_else(|| {
            VaultError::NotFound(format!("content of file '{}' ({})", file.name, file.file_uid))
        })?;
        super::base64::decode(data)
    }
}
