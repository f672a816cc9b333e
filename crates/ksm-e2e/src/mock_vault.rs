//! Mock vault client for E2E tests
//!
//! This module provides a mock implementation of the VaultClient trait that
//! serves fixture records and tracks every call without any network access.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use ksm_notation::{KeeperFile, RecordSet, SecretsManagerOptions, VaultClient, VaultError};

/// Mock vault client that records calls without contacting a real vault
pub struct MockVaultClient {
    /// Records served by `fetch_records`
    records: RwLock<RecordSet>,
    /// File content by file UID
    files: DashMap<String, Vec<u8>>,
    /// UIDs requested by each fetch, in order
    fetched: Mutex<Vec<Vec<String>>>,
    fetch_count: AtomicUsize,
    download_count: AtomicUsize,
    /// Delay applied to each fetch, to keep lookups in flight
    fetch_delay: RwLock<Duration>,
    /// Whether to simulate an authentication failure on fetch
    fail_fetch: AtomicBool,
}

impl MockVaultClient {
    /// Create a mock serving `records`
    pub fn new(records: RecordSet) -> Arc<Self> {
        Arc::new(Self {
            records: RwLock::new(records),
            files: DashMap::new(),
            fetched: Mutex::new(Vec::new()),
            fetch_count: AtomicUsize::new(0),
            download_count: AtomicUsize::new(0),
            fetch_delay: RwLock::new(Duration::ZERO),
            fail_fetch: AtomicBool::new(false),
        })
    }

    /// Set the content served for a file UID
    pub fn set_file(&self, file_uid: &str, content: impl Into<Vec<u8>>) {
        self.files.insert(file_uid.to_string(), content.into());
    }

    /// Replace the served records
    pub fn set_records(&self, records: RecordSet) {
        *self.records.write() = records;
    }

    /// Delay every subsequent fetch
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.write() = delay;
    }

    /// Configure mock to fail fetches
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Number of `fetch_records` calls so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Number of `download_file` calls so far
    pub fn download_count(&self) -> usize {
        self.download_count.load(Ordering::SeqCst)
    }

    /// UIDs passed to each fetch (for test assertions)
    pub fn fetched_uids(&self) -> Vec<Vec<String>> {
        self.fetched.lock().clone()
    }
}

impl VaultClient for MockVaultClient {
    fn fetch_records(
        &self,
        options: &SecretsManagerOptions,
        uids: &[&str],
    ) -> Result<RecordSet, VaultError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.fetched
            .lock()
            .push(uids.iter().map(|uid| uid.to_string()).collect());

        let delay = *self.fetch_delay.read();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(VaultError::AccessDenied(format!(
                "Simulated auth failure for {}",
                options.client_id
            )));
        }

        let records = self
            .records
            .read()
            .records
            .iter()
            .filter(|r| uids.contains(&r.record_uid.as_str()))
            .cloned()
            .collect();
        tracing::debug!("MockVaultClient: fetched {:?}", uids);
        Ok(RecordSet { records })
    }

    fn download_file(&self, file: &KeeperFile) -> Result<Vec<u8>, VaultError> {
        self.download_count.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(&file.file_uid)
            .map(|content| content.value().clone())
            .ok_or_else(|| VaultError::NotFound(format!("file {}", file.file_uid)))
    }
}
