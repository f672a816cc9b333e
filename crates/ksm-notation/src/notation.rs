use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{NotationError, PredicateError, SegmentCount};

/// Prefix that may precede a notation, typically when it comes from an environment variable
pub const NOTATION_PREFIX: &str = "keeper";

/// Required length of a record UID
pub const RECORD_UID_LENGTH: usize = 22;

/// Namespace inside a record where the field key is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    /// Standard record fields
    Field,
    /// User-defined custom fields
    CustomField,
    /// File attachments
    File,
}

impl FieldCategory {
    /// Look up a category by its notation name (ASCII case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Field, Self::CustomField, Self::File]
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name))
    }

    /// Name as written in a notation
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Field => "field",
            FieldCategory::CustomField => "custom_field",
            FieldCategory::File => "file",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed Keeper notation: `[keeper://]uid/category/key[predicate][predicate]`
///
/// Components are validated at parse time. The only mutable part is the
/// resolved value, which a [`ReferenceResolver`](crate::ReferenceResolver)
/// writes at most once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotationReference {
    raw_notation: String,
    record_uid: String,
    field_category: FieldCategory,
    field_key: String,
    return_single: bool,
    array_index: i32,
    dict_key: Option<String>,
    #[serde(skip)]
    resolved_value: Option<String>,
}

impl NotationReference {
    /// Parse a notation string, validating every grammar rule
    pub fn parse(notation: &str) -> Result<Self, NotationError> {
        let (notation, prefixed) = strip_prefix(notation)?;
        // A leading `k` without a full prefix is most likely a mistyped `keeper://`
        let misspelled_prefix = !prefixed && notation.starts_with(&NOTATION_PREFIX[..1]);

        let parts = split_trimmed(notation, "/");
        let (uid, category, key) = match parts.as_slice() {
            [uid, category, key] => (*uid, *category, *key),
            parts => {
                let count = if parts.len() < 3 {
                    SegmentCount::TooFew
                } else {
                    SegmentCount::TooMany
                };
                return Err(NotationError::SegmentCount {
                    count,
                    misspelled_prefix,
                });
            }
        };

        let length = uid.chars().count();
        if length != RECORD_UID_LENGTH {
            return Err(NotationError::InvalidUid { length });
        }

        let field_category =
            FieldCategory::from_name(category).ok_or_else(|| NotationError::InvalidCategory {
                category: category.to_string(),
            })?;

        let (field_key, predicate) = match key.find('[') {
            Some(start) => (&key[..start], parse_predicates(&key[start..])?),
            None => (key, Predicate::default()),
        };

        Ok(Self {
            raw_notation: notation.to_string(),
            record_uid: uid.to_string(),
            field_category,
            field_key: field_key.to_string(),
            return_single: predicate.return_single,
            array_index: predicate.index,
            dict_key: predicate.dict_key,
            resolved_value: None,
        })
    }

    /// Notation with any `keeper://` prefix removed, as handed to the vault client
    pub fn raw_notation(&self) -> &str {
        &self.raw_notation
    }

    pub fn record_uid(&self) -> &str {
        &self.record_uid
    }

    pub fn field_category(&self) -> FieldCategory {
        self.field_category
    }

    /// Field type, label or file name, without predicates
    pub fn field_key(&self) -> &str {
        &self.field_key
    }

    /// False when the whole array was requested with `[]`
    pub fn return_single(&self) -> bool {
        self.return_single
    }

    pub fn array_index(&self) -> i32 {
        self.array_index
    }

    pub fn dict_key(&self) -> Option<&str> {
        self.dict_key.as_deref()
    }

    /// Value memoized by a previous resolution, if any
    pub fn resolved_value(&self) -> Option<&str> {
        self.resolved_value.as_deref()
    }

    /// Store the resolved value; later writes are ignored
    pub(crate) fn memoize(&mut self, value: String) -> &str {
        debug_assert!(
            self.resolved_value.is_none(),
            "resolved value written twice for {}",
            self.raw_notation
        );
        self.resolved_value.get_or_insert(value).as_str()
    }
}

impl FromStr for NotationReference {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NotationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_notation)
    }
}

/// Custom serde deserializer parsing the notation from a string
impl<'de> Deserialize<'de> for NotationReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NotationReference::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Selector state extracted from the bracketed predicates
#[derive(Debug, PartialEq)]
struct Predicate {
    return_single: bool,
    index: i32,
    dict_key: Option<String>,
}

impl Default for Predicate {
    fn default() -> Self {
        Self {
            return_single: true,
            index: 0,
            dict_key: None,
        }
    }
}

/// Remove the `keeper://` prefix, returning the remainder and whether it was stripped
fn strip_prefix(notation: &str) -> Result<(&str, bool), NotationError> {
    if !notation.starts_with(NOTATION_PREFIX) {
        return Ok((notation, false));
    }

    match split_trimmed(notation, "//").as_slice() {
        [_, rest, ..] => Ok((*rest, true)),
        _ => Err(NotationError::MalformedScheme),
    }
}

/// Parse the predicate block, which starts at the first `[` of the key
fn parse_predicates(block: &str) -> Result<Predicate, NotationError> {
    let groups = split_trimmed(block, "]");
    if groups.len() > 2 {
        return Err(PredicateError::TooManyGroups.into());
    }

    let mut predicate = Predicate::default();

    let first = groups.first().map(|g| drop_first_char(g)).unwrap_or("");
    if first.is_empty() {
        predicate.return_single = false;
    } else if let Ok(index) = first.parse::<i32>() {
        predicate.index = index;
    } else if is_dict_key(first) {
        predicate.dict_key = Some(first.to_string());
    }
    // Anything else is ignored and selects index 0

    if let Some(group) = groups.get(1) {
        if !predicate.return_single {
            return Err(PredicateError::WholeArrayWithKey.into());
        }
        if predicate.index != 0 {
            return Err(PredicateError::IndexWithKey {
                index: predicate.index,
            }
            .into());
        }

        let second = drop_first_char(group);
        if second.parse::<i32>().is_ok() {
            return Err(PredicateError::NumericKey {
                key: second.to_string(),
            }
            .into());
        }
        if !is_dict_key(second) {
            return Err(PredicateError::BlankKey.into());
        }
        predicate.dict_key = Some(second.to_string());
    }

    Ok(predicate)
}

/// Split on `pat`, dropping trailing empty segments
fn split_trimmed<'a>(s: &'a str, pat: &str) -> Vec<&'a str> {
    let mut parts: Vec<&str> = s.split(pat).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

/// Strip the opening `[` (or whatever character sits in its place)
fn drop_first_char(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next();
    chars.as_str()
}

/// Dictionary keys are non-empty runs of ASCII letters, digits and underscores
fn is_dict_key(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const UID: &str = "Kr3dO0RXfAbbwkGvPXgQpw";

    fn parse(rest: &str) -> Result<NotationReference, NotationError> {
        NotationReference::parse(&format!("{UID}/{rest}"))
    }

    fn predicate_error(rest: &str) -> PredicateError {
        match parse(rest) {
            Err(NotationError::PredicateSyntax(e)) => e,
            other => panic!("expected predicate error for {rest}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_plain_notation() {
        let reference = parse("field/password").unwrap();
        assert_eq!(reference.record_uid(), UID);
        assert_eq!(reference.field_category(), FieldCategory::Field);
        assert_eq!(reference.field_key(), "password");
        assert!(reference.return_single());
        assert_eq!(reference.array_index(), 0);
        assert_eq!(reference.dict_key(), None);
        assert_eq!(reference.resolved_value(), None);
        assert_eq!(reference.raw_notation(), format!("{UID}/field/password"));
    }

    #[test]
    fn test_parse_each_category() {
        assert_eq!(
            parse("custom_field/Admin Login").unwrap().field_category(),
            FieldCategory::CustomField
        );
        assert_eq!(
            parse("file/id_rsa.pub").unwrap().field_category(),
            FieldCategory::File
        );
        assert_eq!(
            parse("FIELD/login").unwrap().field_category(),
            FieldCategory::Field
        );
    }

    #[test]
    fn test_prefixed_and_bare_notation_match() {
        let bare = parse("field/password").unwrap();
        let prefixed: NotationReference = format!("keeper://{UID}/field/password").parse().unwrap();
        assert_eq!(prefixed.record_uid(), bare.record_uid());
        assert_eq!(prefixed.field_category(), bare.field_category());
        assert_eq!(prefixed.field_key(), bare.field_key());
        assert_eq!(prefixed.return_single(), bare.return_single());
        assert_eq!(prefixed.array_index(), bare.array_index());
        assert_eq!(prefixed.dict_key(), bare.dict_key());
        // The prefix never reaches the vault client
        assert_eq!(prefixed.raw_notation(), bare.raw_notation());
    }

    #[test]
    fn test_prefix_without_separator() {
        assert_eq!(
            NotationReference::parse(&format!("keeper:{UID}/field/password")),
            Err(NotationError::MalformedScheme)
        );
        assert_eq!(
            NotationReference::parse("keeper://"),
            Err(NotationError::MalformedScheme)
        );
    }

    #[test]
    fn test_too_few_segments() {
        assert_eq!(
            parse("field"),
            Err(NotationError::SegmentCount {
                count: SegmentCount::TooFew,
                misspelled_prefix: false,
            })
        );
        // Trailing slash leaves the key empty, which counts as missing
        assert!(matches!(
            parse("field/"),
            Err(NotationError::SegmentCount {
                count: SegmentCount::TooFew,
                ..
            })
        ));
    }

    #[test]
    fn test_too_many_segments() {
        assert_eq!(
            parse("field/password/extra"),
            Err(NotationError::SegmentCount {
                count: SegmentCount::TooMany,
                misspelled_prefix: false,
            })
        );
    }

    #[test]
    fn test_misspelled_prefix_hint() {
        let err = NotationReference::parse(&format!("keepr://{UID}/field/password")).unwrap_err();
        assert_eq!(
            err,
            NotationError::SegmentCount {
                count: SegmentCount::TooMany,
                misspelled_prefix: true,
            }
        );
        assert!(err.to_string().contains("keeper:// prefix might be misspelled"));
    }

    #[test]
    fn test_misspelled_prefix_hint_on_too_few() {
        let err = NotationReference::parse("kr3dO0RXfAbbwkGvPXgQpw/field").unwrap_err();
        assert_eq!(
            err,
            NotationError::SegmentCount {
                count: SegmentCount::TooFew,
                misspelled_prefix: true,
            }
        );
        assert!(err.to_string().contains("missing values"));
        assert!(err.to_string().contains("keeper:// prefix might be misspelled"));
    }

    #[test]
    fn test_no_hint_after_stripped_prefix() {
        // The UID starts with `k`, but the prefix was written correctly
        let err = NotationReference::parse("keeper://kr3dO0RXfAbbwkGvPXgQpw/field/a/b").unwrap_err();
        assert_eq!(
            err,
            NotationError::SegmentCount {
                count: SegmentCount::TooMany,
                misspelled_prefix: false,
            }
        );
        assert!(!err.to_string().contains("misspelled"));
    }

    #[test]
    fn test_no_hint_without_leading_k() {
        let err = NotationReference::parse("Ar3dO0RXfAbbwkGvPXgQpw/field").unwrap_err();
        assert_eq!(
            err,
            NotationError::SegmentCount {
                count: SegmentCount::TooFew,
                misspelled_prefix: false,
            }
        );
        assert!(!err.to_string().contains("misspelled"));
    }

    #[test]
    fn test_text_after_second_separator_is_dropped() {
        // Only the segment between the first and second `//` is kept
        let reference =
            NotationReference::parse(&format!("keeper://{UID}/field/a//junk")).unwrap();
        assert_eq!(reference.raw_notation(), format!("{UID}/field/a"));
        assert_eq!(reference.field_key(), "a");
    }

    #[test]
    fn test_invalid_uid_length() {
        let err = NotationReference::parse("short/field/password").unwrap_err();
        assert_eq!(err, NotationError::InvalidUid { length: 5 });

        // UID is checked before the category
        let err = NotationReference::parse("short/bogus/password").unwrap_err();
        assert!(matches!(err, NotationError::InvalidUid { .. }));
    }

    #[test]
    fn test_invalid_category() {
        let err = parse("fields/password").unwrap_err();
        assert_eq!(
            err,
            NotationError::InvalidCategory {
                category: "fields".to_string()
            }
        );
        assert!(err.to_string().contains("The field type of fields is invalid"));
    }

    #[test]
    fn test_index_predicate() {
        let reference = parse("field/phone[3]").unwrap();
        assert_eq!(reference.field_key(), "phone");
        assert_eq!(reference.array_index(), 3);
        assert!(reference.return_single());
        assert_eq!(reference.dict_key(), None);
    }

    #[test]
    fn test_whole_array_predicate() {
        let reference = parse("field/phone[]").unwrap();
        assert_eq!(reference.field_key(), "phone");
        assert!(!reference.return_single());
        assert_eq!(reference.array_index(), 0);
    }

    #[test]
    fn test_dict_key_predicate() {
        let reference = parse("field/name[first]").unwrap();
        assert_eq!(reference.field_key(), "name");
        assert_eq!(reference.dict_key(), Some("first"));
        assert_eq!(reference.array_index(), 0);
        assert!(reference.return_single());
    }

    #[test]
    fn test_unrecognized_first_predicate_is_ignored() {
        // Lenient: neither an index nor a key, falls back to index 0
        let reference = parse("field/phone[not-a-key]").unwrap();
        assert_eq!(reference.field_key(), "phone");
        assert_eq!(reference.array_index(), 0);
        assert_eq!(reference.dict_key(), None);
        assert!(reference.return_single());
    }

    #[test]
    fn test_second_predicate_selects_dict_key() {
        let reference = parse("field/phone[0][number]").unwrap();
        assert_eq!(reference.array_index(), 0);
        assert_eq!(reference.dict_key(), Some("number"));
        assert!(reference.return_single());

        // A key in the first position is overridden by the second
        let reference = parse("field/phone[any][number]").unwrap();
        assert_eq!(reference.dict_key(), Some("number"));
        assert_eq!(reference.array_index(), 0);
    }

    #[test]
    fn test_whole_array_with_dict_key_rejected() {
        assert_eq!(
            predicate_error("field/phone[][number]"),
            PredicateError::WholeArrayWithKey
        );
    }

    #[test]
    fn test_concrete_index_with_dict_key_rejected() {
        assert_eq!(
            predicate_error("field/phone[3][number]"),
            PredicateError::IndexWithKey { index: 3 }
        );
    }

    #[test]
    fn test_numeric_second_predicate_rejected() {
        assert_eq!(
            predicate_error("field/phone[number][5]"),
            PredicateError::NumericKey {
                key: "5".to_string()
            }
        );
    }

    #[test]
    fn test_blank_second_predicate_rejected() {
        assert_eq!(predicate_error("field/phone[0][ ]"), PredicateError::BlankKey);
        assert_eq!(
            predicate_error("field/phone[0][a-b]"),
            PredicateError::BlankKey
        );
    }

    #[test]
    fn test_too_many_predicates() {
        assert_eq!(
            predicate_error("field/phone[0][a][b]"),
            PredicateError::TooManyGroups
        );
    }

    #[test]
    fn test_deserialize_from_string() {
        #[derive(Deserialize)]
        struct Holder {
            secret: NotationReference,
        }

        let json = format!(r#"{{"secret": "keeper://{UID}/custom_field/token"}}"#);
        let holder: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(holder.secret.field_key(), "token");

        let bad = r#"{"secret": "nope"}"#;
        assert!(serde_json::from_str::<Holder>(bad).is_err());
    }

    #[test]
    fn test_serialize_components() {
        let reference = parse("field/name[first]").unwrap();
        let value = serde_json::to_value(&reference).unwrap();
        assert_eq!(value["record_uid"], UID);
        assert_eq!(value["field_category"], "field");
        assert_eq!(value["dict_key"], "first");
        assert!(value.get("resolved_value").is_none());
    }
}
