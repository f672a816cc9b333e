//! In-process notation evaluator over a fetched [`RecordSet`]
//!
//! Used as the default [`VaultClient`](crate::VaultClient) accessor for
//! clients that hold typed records locally.

use serde_json::Value;

use crate::error::VaultError;
use crate::notation::{FieldCategory, NotationReference};
use crate::vault::{KeeperFile, Record, RecordSet};

/// Evaluate a `field` or `custom_field` notation
pub fn get_value(records: &RecordSet, notation: &str) -> Result<String, VaultError> {
    let reference = parse(notation)?;
    let record = find_record(records, &reference)?;

    let fields = match reference.field_category() {
        FieldCategory::Field => &record.fields,
        FieldCategory::CustomField => &record.custom,
        FieldCategory::File => {
            return Err(VaultError::backend(
                "notation",
                "file notations must be resolved through locate_file",
            ))
        }
    };

    let field = fields
        .iter()
        .find(|f| f.matches(reference.field_key()))
        .ok_or_else(|| {
            VaultError::NotFound(format!(
                "{} '{}' in record {}",
                reference.field_category(),
                reference.field_key(),
                record.record_uid
            ))
        })?;

    if !reference.return_single() {
        return serde_json::to_string(&field.value)
            .map_err(|e| VaultError::InvalidRecord(e.to_string()));
    }

    let value = usize::try_from(reference.array_index())
        .ok()
        .and_then(|index| field.value.get(index))
        .ok_or_else(|| {
            VaultError::NotFound(format!(
                "index {} of '{}' ({} values)",
                reference.array_index(),
                reference.field_key(),
                field.value.len()
            ))
        })?;

    let value = match reference.dict_key() {
        Some(key) => value
            .as_object()
            .ok_or_else(|| {
                VaultError::InvalidRecord(format!(
                    "value of '{}' is not a dictionary",
                    reference.field_key()
                ))
            })?
            .get(key)
            .ok_or_else(|| {
                VaultError::NotFound(format!(
                    "key '{}' in '{}'",
                    key,
                    reference.field_key()
                ))
            })?,
        None => value,
    };

    Ok(stringify(value))
}

/// Find the file attachment a `file` notation points at
pub fn locate_file<'a>(records: &'a RecordSet, notation: &str) -> Result<&'a KeeperFile, VaultError> {
    let reference = parse(notation)?;
    if reference.field_category() != FieldCategory::File {
        return Err(VaultError::backend(
            "notation",
            format!("'{}' does not reference a file", notation),
        ));
    }

    let record = find_record(records, &reference)?;
    record
        .files
        .iter()
        .find(|f| f.matches(reference.field_key()))
        .ok_or_else(|| {
            VaultError::NotFound(format!(
                "file '{}' in record {}",
                reference.field_key(),
                record.record_uid
            ))
        })
}

fn parse(notation: &str) -> Result<NotationReference, VaultError> {
    NotationReference::parse(notation).map_err(|source| VaultError::InvalidNotation {
        notation: notation.to_string(),
        source,
    })
}

fn find_record<'a>(
    records: &'a RecordSet,
    reference: &NotationReference,
) -> Result<&'a Record, VaultError> {
    records
        .find(reference.record_uid())
        .ok_or_else(|| VaultError::NotFound(format!("record {}", reference.record_uid())))
}

/// Strings are returned verbatim, anything else as compact JSON
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
