//! Keeper secret notation parsing and resolution
//!
//! A notation is a compact reference to a value held in a Keeper vault:
//!
//! ```text
//! [keeper://]<record uid>/<field|custom_field|file>/<key>[predicate][predicate]
//! ```
//!
//! - `uid/field/password` - first value of the `password` field
//! - `uid/field/phone[1]` - second value of the `phone` field
//! - `uid/field/phone[]` - the whole value array, as JSON
//! - `uid/field/name[first]` - the `first` key of the first value
//! - `uid/field/phone[0][number]` - the `number` key of the first value
//! - `uid/file/id_rsa` - content of an attached file, as UTF-8 text
//!
//! # Example
//!
//! ```rust,ignore
//! use ksm_notation::{NotationReference, ReferenceResolver, LocalVault};
//!
//! // Parse (and validate) a notation from config
//! let mut reference: NotationReference = "keeper://Kr3dO0RXfAbbwkGvPXgQpw/field/password".parse()?;
//!
//! // Resolve it through a vault client
//! let vault = LocalVault::open("records.json")?;
//! let secret = ReferenceResolver::new(&vault, &options).resolve(&mut reference)?;
//! ```
//!
//! # Features
//!
//! - `local` (default): Enable the local JSON records backend
//! - `base64` (default): Enable base64 decoding of inline attachments

mod backends;
mod error;
mod notation;
mod resolver;
mod vault;

pub mod select;

pub use error::{NotationError, PredicateError, ResolveError, SegmentCount, VaultError};
pub use notation::{FieldCategory, NotationReference, NOTATION_PREFIX, RECORD_UID_LENGTH};
pub use resolver::ReferenceResolver;
pub use vault::{Field, KeeperFile, Record, RecordSet, SecretsManagerOptions, VaultClient};

#[cfg(feature = "local")]
pub use backends::local::LocalVault;

// Re-export base64 helpers for building records files
#[cfg(feature = "base64")]
pub mod base64 {
    pub use crate::backends::base64::{decode, encode};
}
