//! Naming Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A naming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant except [`DirectoryListing`](Self::DirectoryListing) is a
/// pure function of the input: the same file name always fails the same way.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file name matches none of the registered schemas.
    #[display("file name {_0} does not match any known schema")]
    UnrecognizedSchema(#[error(not(source))] String),
    /// The schema's timestamp pattern found nothing in the file name.
    #[display("cannot extract timestamp from {file_name} with pattern {pattern}")]
    TimestampNotFound {
        /// The file name that was searched.
        file_name: String,
        /// The timestamp pattern that failed to match.
        pattern: String,
    },
    /// The timestamp substring was found but does not parse with the schema's format.
    #[display("cannot parse timestamp {value} with format {format}")]
    TimestampParse {
        /// The extracted timestamp substring.
        value: String,
        /// The format description it was parsed with.
        format: String,
    },
    /// The schema declares an index pattern that the file name lacks.
    #[display("cannot extract index from {file_name} with pattern {pattern}")]
    IndexNotFound {
        /// The file name that was searched.
        file_name: String,
        /// The index pattern that failed to match.
        pattern: String,
    },
    /// Zero, or more hex characters than a SHA-256 digest has.
    #[display("source id length {_0} is outside 1..=64")]
    InvalidSourceIdLength(#[error(not(source))] usize),
    /// A schema's pattern or timestamp format did not compile.
    #[display("invalid schema: {_0}")]
    InvalidSchema(#[error(not(source))] String),
    /// A canonical name could not be parsed back into its components.
    #[display("not a canonical file name: {_0}")]
    InvalidCanonicalName(#[error(not(source))] String),
    /// The directory to scan could not be listed.
    #[display("cannot list directory: {}", _0.display())]
    DirectoryListing(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A file name either matches or it doesn't. Only listing a directory
        // touches the filesystem.
        matches!(self, Self::DirectoryListing(_))
    }
}
