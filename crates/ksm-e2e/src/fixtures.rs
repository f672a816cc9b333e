//! Record fixtures shared by the E2E tests

use ksm_notation::{RecordSet, SecretsManagerOptions};
use serde_json::json;

/// UID of the sample record
pub const RECORD_UID: &str = "Kr3dO0RXfAbbwkGvPXgQpw";

/// UID of the sample record's text attachment
pub const FILE_UID: &str = "aF1le0UidAAAAAAAAAAAAA";

/// Options accepted by the mock vault
pub fn test_options() -> SecretsManagerOptions {
    SecretsManagerOptions {
        client_id: "e2e-client".to_string(),
        private_key: "e2e-private-key".to_string(),
        app_key: "e2e-app-key".to_string(),
        hostname: "vault.test".to_string(),
        server_public_key_id: 10,
        allow_unverified_certificate: true,
    }
}

/// A login record with scalar, array, dictionary and custom fields plus two files
pub fn sample_records() -> RecordSet {
    serde_json::from_value(json!({
        "records": [{
            "recordUid": RECORD_UID,
            "title": "Bastion host",
            "type": "sshKeys",
            "fields": [
                {"type": "login", "value": ["deploy"]},
                {"type": "password", "value": ["correct horse battery staple"]},
                {"type": "host", "value": [
                    {"hostName": "10.0.0.5", "port": "22"},
                    {"hostName": "10.0.0.6", "port": "2222"}
                ]},
                {"type": "name", "value": [{"first": "Ada", "last": "Lovelace"}]}
            ],
            "custom": [
                {"type": "text", "label": "Environment", "value": ["production"]},
                {"type": "multiline", "label": "Notes", "value": ["line one", "line two"]}
            ],
            "files": [
                {"fileUid": FILE_UID, "name": "id_ed25519", "title": "Deploy key"},
                {"fileUid": "bF1le0UidBBBBBBBBBBBBB", "name": "blob.bin"}
            ]
        }]
    }))
    .expect("sample records are valid")
}
