//! Vault client backends

#[cfg(feature = "base64")]
pub mod base64;

#[cfg(feature = "local")]
pub mod local;
