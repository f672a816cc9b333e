//! Vault client capability and the record model it returns

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::select;

/// Connection options a vault client authenticates with
#[derive(Clone, PartialEq, Eq)]
pub struct SecretsManagerOptions {
    pub client_id: String,
    pub private_key: String,
    pub app_key: String,
    pub hostname: String,
    pub server_public_key_id: u32,
    pub allow_unverified_certificate: bool,
}

impl fmt::Debug for SecretsManagerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsManagerOptions")
            .field("client_id", &self.client_id)
            .field("private_key", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("server_public_key_id", &self.server_public_key_id)
            .field(
                "allow_unverified_certificate",
                &self.allow_unverified_certificate,
            )
            .finish()
    }
}

/// Records returned by a single fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default)]
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Find a record by UID
    pub fn find(&self, uid: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.record_uid == uid)
    }
}

/// A vault record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_uid: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub custom: Vec<Field>,
    #[serde(default)]
    pub files: Vec<KeeperFile>,
}

/// A typed record field; values are always stored as an array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Vec<serde_json::Value>,
}

impl Field {
    /// A field matches a key by type or label
    pub fn matches(&self, key: &str) -> bool {
        self.field_type == key || self.label.as_deref() == Some(key)
    }
}

/// File attachment metadata, used as the handle for downloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeeperFile {
    pub file_uid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Inline base64 content, present for local records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl KeeperFile {
    /// A file matches a key by name or title
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.title.as_deref() == Some(key)
    }
}

/// Capability for fetching records and files from a vault
///
/// Calls are blocking. Implementations must be `Send + Sync` so the client
/// can be shared with worker threads (e.g. wrapped in `Arc<dyn VaultClient>`).
pub trait VaultClient: Send + Sync {
    /// Fetch the records with the given UIDs
    fn fetch_records(
        &self,
        options: &SecretsManagerOptions,
        uids: &[&str],
    ) -> Result<RecordSet, VaultError>;

    /// Download the content of a file attachment
    fn download_file(&self, file: &KeeperFile) -> Result<Vec<u8>, VaultError>;

    /// Find the file a `file` notation points at
    fn locate_file(&self, records: &RecordSet, notation: &str) -> Result<KeeperFile, VaultError> {
        select::locate_file(records, notation).cloned()
    }

    /// Evaluate a `field` or `custom_field` notation to its string value
    fn get_value(&self, records: &RecordSet, notation: &str) -> Result<String, VaultError> {
        select::get_value(records, notation)
    }
}
