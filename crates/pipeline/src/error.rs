//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A pipeline error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a pipeline failure.
///
/// ### Operational Errors
/// - [`ErrorKind::InvalidUploadKey`]
/// - [`ErrorKind::Conflict`]
/// - [`ErrorKind::NoDevice`], [`ErrorKind::MultipleDevices`],
///   [`ErrorKind::NoDeviceIdentifier`], [`ErrorKind::NoInternalStorage`]
/// - [`ErrorKind::UnknownMediaDirectory`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Naming`]
/// - [`ErrorKind::Io`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A storage backend operation (list, read, write, delete) failed.
    #[display("storage operation failed")]
    Storage,
    /// The naming engine failed outside of standardization itself.
    #[display("naming engine failure")]
    Naming,
    /// Reading from the local filesystem failed.
    #[display("could not read local file {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The object isn't laid out as `devices/{source_id}/{file_name}`.
    #[display("invalid upload key: {_0}")]
    InvalidUploadKey(#[error(not(source))] String),
    /// The target already holds different content.
    #[display("target {} already exists with different content", _0.display())]
    Conflict(#[error(not(source))] PathBuf),
    /// No MTP mount under the gvfs directory.
    #[display("no MTP device found in {}; connect the device and enable file transfer", _0.display())]
    NoDevice(#[error(not(source))] PathBuf),
    /// More than one MTP mount under the gvfs directory.
    #[display("{_0} MTP devices found; connect only one device")]
    MultipleDevices(#[error(not(source))] usize),
    /// The mount path carries no `mtp:host=` identifier.
    #[display("cannot extract device identifier from {}", _0.display())]
    NoDeviceIdentifier(#[error(not(source))] PathBuf),
    /// The device is mounted but its storage isn't visible (usually locked).
    #[display("internal storage not found at {}; check the device is unlocked", _0.display())]
    NoInternalStorage(#[error(not(source))] PathBuf),
    /// Not one of the well-known media folder names.
    #[display("unknown media directory {_0:?}")]
    UnknownMediaDirectory(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoInternalStorage(_))
    }
}
