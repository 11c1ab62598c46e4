//! Path validation.
//!
//! Keys handed to a backend come from file names found on devices, so they
//! are validated before they ever touch a filesystem root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path and returns its normalized form.
///
/// Paths are relative to the backend root: `.` components, duplicate and
/// trailing separators, and a leading `/` are dropped, and `..` is resolved
/// as long as it never climbs above the root.
///
/// > **Note:** This does **not** normalize backslashes or non-UTF8 bytes.
/// >           Null bytes are explicitly rejected.
///
/// # Errors
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath) for traversal above
/// the root, null bytes, platform prefixes, or a path that normalizes to
/// nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use medianorm_storage::validate_path;
///
/// assert!(validate_path("devices/E3B0C442/20240707_121110.jpg").is_ok());
/// assert!(validate_path("2024/07/../07/20240707T121110_E3B0C442_0000.jpg").is_ok());
/// assert!(validate_path("../devices").is_err());
/// assert!(validate_path("devices/../../etc").is_err());
/// assert!(validate_path("a\0b.jpg").is_err());
/// assert_eq!(
///     validate_path("/devices//./E3B0C442/IMG-20240721-WA0007.jpg/").unwrap(),
///     Path::new("devices/E3B0C442/IMG-20240721-WA0007.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(invalid()),
        false => Ok(components.into_iter().collect()),
    }
}
