use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Index used when a schema has no index pattern.
pub const DEFAULT_FILE_INDEX: &str = "0000";

pub(crate) const ANDROID_NAME: &str = "android";
pub(crate) const ANDROID_PATTERN: &str = r"\d{8}_\d{6}.(jpg|mp4)";
pub(crate) const ANDROID_TIMESTAMP_PATTERN: &str = r"\d{8}_\d{6}";
pub(crate) const ANDROID_TIMESTAMP_FORMAT: &str = "[year][month][day]_[hour][minute][second]";

pub(crate) const WHATSAPP_NAME: &str = "whatsapp";
pub(crate) const WHATSAPP_PATTERN: &str = r"^(IMG|VID)-\d{8}-WA[0-9]{4}.(jpg|mp4)";
pub(crate) const WHATSAPP_TIMESTAMP_PATTERN: &str = r"\d{8}";
pub(crate) const WHATSAPP_TIMESTAMP_FORMAT: &str = "[year][month][day]";
pub(crate) const WHATSAPP_INDEX_PATTERN: &str = "WA[0-9]{4}";

/// Literal stripped from every extracted index.
pub(crate) const INDEX_PREFIX: &str = "WA";

/// Timestamp layout embedded in canonical base names.
pub(crate) const CANONICAL_TIMESTAMP_FORMAT: &str = "[year][month][day]T[hour][minute][second]";

regex!(
    CANONICAL_NAME_REGEX,
    r"^(?:(\d{4})/(\d{2})/)?(\d{8}T\d{6})_([^_/]+)_([^_/.]+)\.([^/.]*)$"
);
