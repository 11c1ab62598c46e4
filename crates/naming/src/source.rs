use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Number of hex characters in a canonical source id.
pub const DEFAULT_SOURCE_ID_LENGTH: usize = 8;
/// Hex characters in a SHA-256 digest.
pub const MAX_SOURCE_ID_LENGTH: usize = 64;

/// Derives a compact source id from a raw source identifier (device serial,
/// host name, ...).
///
/// SHA-256 of the UTF-8 bytes, rendered as hex, truncated to `length`
/// characters and uppercased. The empty identifier is valid and yields the
/// well-known "unknown source" id.
///
/// # Errors
/// [`InvalidSourceIdLength`](ErrorKind::InvalidSourceIdLength) when `length`
/// is zero or exceeds [`MAX_SOURCE_ID_LENGTH`].
///
/// # Examples
///
/// ```
/// use medianorm_naming::{DEFAULT_SOURCE_ID_LENGTH, compute_source_id};
///
/// assert_eq!(compute_source_id("", DEFAULT_SOURCE_ID_LENGTH).unwrap(), "E3B0C442");
/// assert_eq!(compute_source_id("Device0", DEFAULT_SOURCE_ID_LENGTH).unwrap(), "D5555C1A");
/// ```
#[instrument(level = "trace")]
pub fn compute_source_id(identifier: &str, length: usize) -> Result<String> {
    if !valid_length(length) {
        exn::bail!(ErrorKind::InvalidSourceIdLength(length));
    }
    let mut digest = hex::encode(Sha256::digest(identifier.as_bytes()));
    digest.truncate(length);
    Ok(digest.to_uppercase())
}

/// An empty source id would leave the canonical name without its source
/// segment.
pub(crate) fn valid_length(length: usize) -> bool {
    (1..=MAX_SOURCE_ID_LENGTH).contains(&length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 8, "E3B0C442")]
    #[case("Device0", 8, "D5555C1A")]
    #[case("SAMSUNG_SAMSUNG_Android_RFCW112HFCK", 8, "78FCB7B4")]
    #[case("local-machine", 16, "A1427345F048C1AF")]
    #[case("Device0", 1, "D")]
    fn test_compute_source_id(#[case] identifier: &str, #[case] length: usize, #[case] expected: &str) {
        assert_eq!(compute_source_id(identifier, length).unwrap(), expected);
    }

    #[test]
    fn test_deterministic() {
        let first = compute_source_id("Pixel 8", DEFAULT_SOURCE_ID_LENGTH).unwrap();
        let second = compute_source_id("Pixel 8", DEFAULT_SOURCE_ID_LENGTH).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "26CC2FAB");
    }

    #[test]
    fn test_full_digest() {
        let id = compute_source_id("", MAX_SOURCE_ID_LENGTH).unwrap();
        assert_eq!(id.len(), 64);
        assert!(id.starts_with("E3B0C44298FC1C14"));
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_SOURCE_ID_LENGTH + 1)]
    fn test_invalid_length(#[case] length: usize) {
        let err = compute_source_id("Device0", length).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidSourceIdLength(length));
    }
}
