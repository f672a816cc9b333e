use thiserror::Error;

/// Hint appended to segment-count errors when the `keeper://` prefix looks mistyped
const PREFIX_HINT: &str = "  The keeper:// prefix might be misspelled.";

fn prefix_hint(misspelled_prefix: &bool) -> &'static str {
    if *misspelled_prefix {
        PREFIX_HINT
    } else {
        ""
    }
}

/// Errors produced while parsing a notation string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    /// `keeper` prefix present but no `//` separator with content after it
    #[error("Notation is missing information about the uid, field data type, and field key.")]
    MalformedScheme,

    /// Top-level `/` split did not produce exactly three segments
    #[error("{}{}", .count.message(), prefix_hint(.misspelled_prefix))]
    SegmentCount {
        count: SegmentCount,
        misspelled_prefix: bool,
    },

    /// Record UID is not 22 characters long
    #[error("The record uid is not the correct length. Expected 22 characters, found {length}.")]
    InvalidUid { length: usize },

    /// Unknown field category
    #[error(
        "The field type can only be field, custom_field, or file. The field type of {category} is invalid."
    )]
    InvalidCategory { category: String },

    /// Bracketed predicate on the field key is invalid
    #[error("The predicate of the notation appears to be invalid. {0}")]
    PredicateSyntax(#[from] PredicateError),
}

/// Which way the segment count was wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentCount {
    TooFew,
    TooMany,
}

impl SegmentCount {
    fn message(&self) -> &'static str {
        match self {
            SegmentCount::TooFew => {
                "Notation format appears to be missing values. There should be 3 values separated by a '/' character."
            }
            SegmentCount::TooMany => {
                "Notation format appears to contain too many values. There should be 3 values separated by a '/' character."
            }
        }
    }
}

/// Predicate grammar violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("Too many [], max 2 allowed.")]
    TooManyGroups,

    #[error("If the second [] is a dictionary key, the first [] cannot request the whole array.")]
    WholeArrayWithKey,

    #[error("If the second [] is a dictionary key, the first [] needs to have any index, not {index}.")]
    IndexWithKey { index: i32 },

    #[error("The second [] must be a dictionary key, not the array index {key}.")]
    NumericKey { key: String },

    #[error("The second [] must have key for the dictionary. Cannot be blank.")]
    BlankKey,
}

/// Errors raised by a vault client
#[derive(Debug, Error)]
pub enum VaultError {
    /// Record, field, file or value missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials rejected by the vault
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Record content does not have the expected shape
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Notation handed to the evaluator could not be parsed
    #[error("Invalid notation '{notation}': {source}")]
    InvalidNotation {
        notation: String,
        #[source]
        source: NotationError,
    },

    /// Backend runtime error
    #[error("{backend} error: {message}")]
    Backend { backend: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Create a backend error
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while resolving a parsed reference
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Failure reported by the vault client
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    /// Downloaded file content is not UTF-8 text
    #[error("File '{file}' is not valid UTF-8 text: {source}")]
    InvalidUtf8 {
        file: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}
