//! The canonical file name value and its renderings.

use exn::{OptionExt, ResultExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use time::PrimitiveDateTime;

use crate::consts::{CANONICAL_NAME_REGEX, CANONICAL_TIMESTAMP_FORMAT, DEFAULT_FILE_INDEX};
use crate::error::{Error, ErrorKind, Result};
use crate::extract::TimestampFormat;

static CANONICAL_TIMESTAMP: LazyLock<TimestampFormat> = LazyLock::new(|| CANONICAL_TIMESTAMP_FORMAT.parse().unwrap());

/// A sequence index, either extracted verbatim or formatted from a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence(String);
impl Default for Sequence {
    fn default() -> Self {
        Self(DEFAULT_FILE_INDEX.to_string())
    }
}
impl From<u16> for Sequence {
    fn from(value: u16) -> Self {
        Self(format!("{value:04}"))
    }
}
impl From<&str> for Sequence {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
impl From<String> for Sequence {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl From<Sequence> for String {
    fn from(value: Sequence) -> Self {
        value.0
    }
}

/// Immutable representation of a standardized file name.
///
/// Format: `YYYY/MM/YYYYMMDDThhmmss_SOURCE_SEQUENCE.ext`, for example
/// `2024/07/20240703T182842_A1B2C3D4_0042.jpg`. All renderings are pure
/// functions of the four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StandardizedFileName {
    /// Capture time; midnight when the source name carries no time.
    pub timestamp: PrimitiveDateTime,
    /// Uppercase hex source id.
    pub source: String,
    /// Zero-padded sequence index.
    pub sequence: String,
    /// Original extension, case preserved, without the dot.
    pub extension: String,
}
impl StandardizedFileName {
    /// Creates a name from its parts, zero-padding numeric sequences.
    ///
    /// ```
    /// use medianorm_naming::StandardizedFileName;
    /// use time::macros::datetime;
    ///
    /// let name = StandardizedFileName::from_components(datetime!(2024-07-03 18:28:42), "A1B2C3D4", 42u16, "jpg");
    /// assert_eq!(name.full_path(), "2024/07/20240703T182842_A1B2C3D4_0042.jpg");
    /// ```
    pub fn from_components(
        timestamp: PrimitiveDateTime,
        source: impl Into<String>,
        sequence: impl Into<Sequence>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            source: source.into(),
            sequence: sequence.into().into(),
            extension: extension.into(),
        }
    }

    /// Replaces the source segment with an already computed source id.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Year/month directory prefix: `YYYY/MM/`.
    pub fn prefix(&self) -> String {
        format!("{:04}/{:02}/", self.timestamp.year(), u8::from(self.timestamp.month()))
    }

    /// File name without directories: `YYYYMMDDThhmmss_SOURCE_SEQUENCE.ext`.
    pub fn base_name(&self) -> String {
        let ts = self.timestamp;
        format!(
            "{:04}{:02}{:02}T{:02}{:02}{:02}_{}_{}.{}",
            ts.year(),
            u8::from(ts.month()),
            ts.day(),
            ts.hour(),
            ts.minute(),
            ts.second(),
            self.source,
            self.sequence,
            self.extension
        )
    }

    /// Prefix and base name: `YYYY/MM/YYYYMMDDThhmmss_SOURCE_SEQUENCE.ext`.
    pub fn full_path(&self) -> String {
        self.prefix() + &self.base_name()
    }

    /// The full path as a [`PathBuf`], optionally joined under `base`.
    pub fn to_path(&self, base: Option<&Path>) -> PathBuf {
        let path = PathBuf::from(self.full_path());
        match base {
            Some(base) => base.join(path),
            None => path,
        }
    }
}
impl fmt::Display for StandardizedFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}
impl FromStr for StandardizedFileName {
    type Err = Error;

    /// Parses a canonical full path or base name.
    ///
    /// The `YYYY/MM/` prefix is optional, but when present it must agree with
    /// the embedded timestamp.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ErrorKind::InvalidCanonicalName(s.to_string());
        let captures = CANONICAL_NAME_REGEX.captures(s).ok_or_raise(invalid)?;
        let group = |i: usize| captures.get(i).map(|m| m.as_str());
        let timestamp_str = group(3).ok_or_raise(invalid)?;
        let timestamp = CANONICAL_TIMESTAMP.parse(timestamp_str).or_raise(invalid)?;
        let name = Self {
            timestamp,
            source: group(4).ok_or_raise(invalid)?.to_string(),
            sequence: group(5).ok_or_raise(invalid)?.to_string(),
            extension: group(6).unwrap_or_default().to_string(),
        };
        if let (Some(year), Some(month)) = (group(1), group(2))
            && name.prefix() != format!("{year}/{month}/")
        {
            exn::bail!(invalid());
        }
        Ok(name)
    }
}
