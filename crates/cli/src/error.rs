//! Command Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open storage stage {_0:?}")]
    Storage(#[error(not(source))] &'static str),
    #[display("unknown schema {_0:?}")]
    UnknownSchema(#[error(not(source))] String),
    #[display("could not standardize files")]
    Naming,
    #[display("pipeline failure")]
    Pipeline,
    /// The device is connected but not accessible yet.
    #[display("device is not ready")]
    DeviceNotReady,
    /// Some items failed; each was already reported on its own.
    #[display("{_0} item(s) failed")]
    Failed(#[error(not(source))] usize),
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeviceNotReady)
    }
}
