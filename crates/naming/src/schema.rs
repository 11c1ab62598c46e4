//! File name schemas.
//!
//! A schema is plain data: a whole-name pattern used for classification plus
//! the sub-patterns and format needed to pull a timestamp and an optional
//! sequence index out of a matching name. Supporting another device is a
//! matter of registering another [`FileNameSchema`], not writing code.

use exn::ResultExt;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::consts;
use crate::error::{Error, ErrorKind, Result};
use crate::extract::TimestampFormat;

static ANDROID: LazyLock<FileNameSchema> = LazyLock::new(|| {
    FileNameSchema::new(
        consts::ANDROID_NAME,
        consts::ANDROID_PATTERN,
        consts::ANDROID_TIMESTAMP_PATTERN,
        consts::ANDROID_TIMESTAMP_FORMAT,
        None,
    )
    .unwrap()
});

static WHATSAPP: LazyLock<FileNameSchema> = LazyLock::new(|| {
    FileNameSchema::new(
        consts::WHATSAPP_NAME,
        consts::WHATSAPP_PATTERN,
        consts::WHATSAPP_TIMESTAMP_PATTERN,
        consts::WHATSAPP_TIMESTAMP_FORMAT,
        Some(consts::WHATSAPP_INDEX_PATTERN),
    )
    .unwrap()
});

/// A named bundle of patterns describing one device or app's naming convention.
///
/// All patterns and the timestamp format are compiled on construction, so an
/// invalid schema never reaches classification.
#[derive(Debug, Clone)]
pub struct FileNameSchema {
    name: String,
    whole_name: Regex,
    timestamp: Regex,
    timestamp_format: TimestampFormat,
    index: Option<Regex>,
}
impl PartialEq for FileNameSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.whole_name.as_str() == other.whole_name.as_str()
            && self.timestamp.as_str() == other.timestamp.as_str()
            && self.timestamp_format == other.timestamp_format
            && self.index.as_ref().map(Regex::as_str) == other.index.as_ref().map(Regex::as_str)
    }
}
impl Eq for FileNameSchema {}
impl FileNameSchema {
    /// Compiles a new schema.
    ///
    /// # Errors
    /// [`InvalidSchema`](ErrorKind::InvalidSchema) if any pattern or the
    /// timestamp format fails to compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use medianorm_naming::FileNameSchema;
    ///
    /// let screenshots = FileNameSchema::new(
    ///     "screenshot",
    ///     r"^Screenshot_\d{8}-\d{6}",
    ///     r"\d{8}-\d{6}",
    ///     "[year][month][day]-[hour][minute][second]",
    ///     None,
    /// ).unwrap();
    /// assert!(screenshots.matches("Screenshot_20240707-121110.png"));
    /// ```
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        timestamp_pattern: &str,
        timestamp_format: &str,
        index_pattern: Option<&str>,
    ) -> Result<Self> {
        let name = name.into();
        let compile = |pattern: &str| {
            Regex::new(pattern).or_raise(|| ErrorKind::InvalidSchema(format!("{name}: invalid pattern {pattern}")))
        };
        let whole_name = compile(pattern)?;
        let timestamp = compile(timestamp_pattern)?;
        let index = index_pattern.map(compile).transpose()?;
        let timestamp_format = timestamp_format
            .parse::<TimestampFormat>()
            .or_raise(|| ErrorKind::InvalidSchema(format!("{name}: invalid timestamp format")))?;
        Ok(Self {
            name,
            whole_name,
            timestamp,
            timestamp_format,
            index,
        })
    }

    /// Android camera names, e.g. `20240707_121110.jpg`.
    pub fn android() -> &'static Self {
        &ANDROID
    }

    /// WhatsApp media names, e.g. `IMG-20240721-WA0007.jpg`.
    pub fn whatsapp() -> &'static Self {
        &WHATSAPP
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.whole_name
    }

    pub fn timestamp_pattern(&self) -> &Regex {
        &self.timestamp
    }

    pub fn timestamp_format(&self) -> &TimestampFormat {
        &self.timestamp_format
    }

    pub fn index_pattern(&self) -> Option<&Regex> {
        self.index.as_ref()
    }

    /// Whether the whole-name pattern matches anywhere in `file_name`.
    ///
    /// Unanchored: extra leading or trailing characters still match unless
    /// the pattern itself anchors.
    pub fn matches(&self, file_name: &str) -> bool {
        self.whole_name.is_match(file_name)
    }
}
impl fmt::Display for FileNameSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The built-in schemas, addressable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Android,
    WhatsApp,
}
impl FromStr for SchemaKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            consts::ANDROID_NAME => Ok(Self::Android),
            consts::WHATSAPP_NAME => Ok(Self::WhatsApp),
            _ => exn::bail!(ErrorKind::InvalidSchema(format!("unknown built-in schema: {s}"))),
        }
    }
}
impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema().name())
    }
}
impl SchemaKind {
    /// Built-ins in classification order.
    pub const ALL: [SchemaKind; 2] = [SchemaKind::Android, SchemaKind::WhatsApp];

    pub fn schema(self) -> &'static FileNameSchema {
        match self {
            Self::Android => FileNameSchema::android(),
            Self::WhatsApp => FileNameSchema::whatsapp(),
        }
    }
}
