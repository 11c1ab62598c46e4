//! Config Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A provider failed to load, or the merged values don't deserialize.
    #[display("could not load configuration")]
    Load,
    /// A value deserialized but makes no sense.
    #[display("invalid configuration value for {_0}")]
    Invalid(#[error(not(source))] String),
    /// A configured schema failed to compile.
    #[display("invalid schema {_0}")]
    Schema(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
