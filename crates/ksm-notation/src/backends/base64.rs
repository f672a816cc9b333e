//! Base64 decoding of inline attachment data

use base64::Engine;

use crate::error::VaultError;

/// Decode base64-encoded attachment content
pub fn decode(data: &str) -> Result<Vec<u8>, VaultError> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| VaultError::backend("base64", format!("decode error: {}", e)))
}

/// Encode content for embedding in a records file
pub fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
