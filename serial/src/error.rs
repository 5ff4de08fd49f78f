//! Error types for archive traversal.

use relic_core::{AssetId, IdLength};
use thiserror::Error;

/// Errors raised while reading or writing an archive.
///
/// These cover bad input and I/O. Schema bugs (unbalanced stack frames,
/// attributes with children, duplicate container keys) are assertions.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid UTF-8 in string data")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("cannot parse '{value}' as {expected}")]
    Parse { value: String, expected: &'static str },
    #[error("unknown {type_name} value '{value}'")]
    UnknownDiscriminant {
        type_name: &'static str,
        value: String,
    },
    #[error("no constructor registered for {type_name} kind {kind}")]
    NoConstructor {
        type_name: &'static str,
        kind: String,
    },
    #[error("bulk data length mismatch: expected {expected} bytes, found {found}")]
    BulkLength { expected: usize, found: usize },
    #[error("container of {count} elements exceeds the limit of {limit}")]
    ArraySize { count: u64, limit: u64 },
    #[error("asset id {id} does not fit a {length:?} archive")]
    IdWidth { id: AssetId, length: IdLength },
    #[error("stream holds {type_name} kind {found} but the existing object is {expected}")]
    KindMismatch {
        type_name: &'static str,
        expected: String,
        found: String,
    },
    #[error("archive version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u16, supported: u16 },
    #[error("malformed document: {0}")]
    Document(String),
    #[error("unbalanced parameter scopes: {0}")]
    Unbalanced(&'static str),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
