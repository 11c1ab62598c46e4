//! Extraction of timestamps, indexes and extensions from raw file names.
//!
//! These are the building blocks of [`standardize`](crate::standardize). They
//! are usable on their own, so each one reports its own failure instead of
//! assuming the file name already passed classification.

use exn::{OptionExt, ResultExt};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use time::format_description::{self, OwnedFormatItem};
use time::parsing::Parsed;
use time::{Date, PrimitiveDateTime, Time};
use tracing::instrument;

use crate::consts::INDEX_PREFIX;
use crate::error::{Error, ErrorKind, Result};

/// A compiled timestamp format description.
///
/// Uses the [`time`] crate's format description syntax, e.g.
/// `[year][month][day]_[hour][minute][second]`. Formats without any hour
/// component parse to midnight.
#[derive(Debug, Clone)]
pub struct TimestampFormat {
    description: String,
    items: OwnedFormatItem,
}
impl FromStr for TimestampFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let items = format_description::parse_owned::<2>(s)
            .or_raise(|| ErrorKind::InvalidSchema(format!("invalid timestamp format: {s}")))?;
        Ok(Self { description: s.to_string(), items })
    }
}
impl PartialEq for TimestampFormat {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
    }
}
impl Eq for TimestampFormat {}
impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
impl TimestampFormat {
    pub fn as_str(&self) -> &str {
        &self.description
    }

    /// Parses the whole of `value`; leftover input is an error.
    pub fn parse(&self, value: &str) -> Result<PrimitiveDateTime> {
        let error = || ErrorKind::TimestampParse {
            value: value.to_string(),
            format: self.description.clone(),
        };
        let mut parsed = Parsed::new();
        let remaining = parsed.parse_item(value.as_bytes(), &self.items).or_raise(error)?;
        if !remaining.is_empty() {
            exn::bail!(error());
        }
        let date = Date::try_from(parsed).or_raise(error)?;
        let time = match parsed.hour_24().is_some() || parsed.hour_12().is_some() {
            true => Time::try_from(parsed).or_raise(error)?,
            false => Time::MIDNIGHT,
        };
        Ok(PrimitiveDateTime::new(date, time))
    }
}

/// Returns the first substring of `file_name` matching `pattern`.
///
/// # Errors
/// [`TimestampNotFound`](ErrorKind::TimestampNotFound) when nothing matches.
///
/// # Examples
///
/// ```
/// use medianorm_naming::extract_timestamp_str;
/// use regex::Regex;
///
/// let pattern = Regex::new(r"\d{8}").unwrap();
/// assert_eq!(extract_timestamp_str("IMG-20240721-WA0007.jpg", &pattern).unwrap(), "20240721");
/// ```
#[instrument(level = "trace", skip(pattern), fields(pattern = pattern.as_str()))]
pub fn extract_timestamp_str<'a>(file_name: &'a str, pattern: &Regex) -> Result<&'a str> {
    pattern.find(file_name).map(|m| m.as_str()).ok_or_raise(|| ErrorKind::TimestampNotFound {
        file_name: file_name.to_string(),
        pattern: pattern.as_str().to_string(),
    })
}

/// Parses an extracted timestamp substring with the schema's format.
///
/// The underlying [`time`] parse failure is kept as the child of the raised
/// [`TimestampParse`](ErrorKind::TimestampParse) error.
#[instrument(level = "trace", fields(format = format.as_str()), skip(format))]
pub fn parse_timestamp(value: &str, format: &TimestampFormat) -> Result<PrimitiveDateTime> {
    format.parse(value)
}

/// Returns the sequence index found by `pattern`, with every `WA` removed.
///
/// The `WA` cleanup only makes sense for WhatsApp names but applies to any
/// schema that declares an index pattern.
///
/// # Examples
///
/// ```
/// use medianorm_naming::extract_index;
/// use regex::Regex;
///
/// let pattern = Regex::new("WA[0-9]{4}").unwrap();
/// assert_eq!(extract_index("IMG-20240721-WA0007.jpg", &pattern).unwrap(), "0007");
/// ```
#[instrument(level = "trace", skip(pattern), fields(pattern = pattern.as_str()))]
pub fn extract_index(file_name: &str, pattern: &Regex) -> Result<String> {
    pattern.find(file_name).map(|m| m.as_str().replace(INDEX_PREFIX, "")).ok_or_raise(|| ErrorKind::IndexNotFound {
        file_name: file_name.to_string(),
        pattern: pattern.as_str().to_string(),
    })
}

/// Everything after the last `.`, verbatim. A name without a dot is its own
/// extension.
pub fn extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}
