use exn::{OptionExt, ResultExt};
use medianorm_naming::compute_source_id;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// Top-level directory of the upload stage.
pub const DEVICES_PREFIX: &str = "devices";
/// Where uploads are written before they are renamed under [`DEVICES_PREFIX`].
pub const STAGING_PREFIX: &str = "incoming";

/// Location of an uploaded file: `devices/{source_id}/{file_name}`.
///
/// The source id is computed once, when the file is uploaded; processing
/// reuses it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadKey {
    source_id: String,
    file_name: String,
}
impl UploadKey {
    /// # Errors
    /// [`InvalidUploadKey`](ErrorKind::InvalidUploadKey) if either segment is
    /// empty, contains a separator, or is a relative directory reference.
    pub fn new(source_id: impl Into<String>, file_name: impl Into<String>) -> Result<Self> {
        let (source_id, file_name) = (source_id.into(), file_name.into());
        let segment_ok = |s: &str| !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\', '\0']);
        if !segment_ok(&source_id) || !segment_ok(&file_name) {
            exn::bail!(ErrorKind::InvalidUploadKey(format!("{DEVICES_PREFIX}/{source_id}/{file_name}")));
        }
        Ok(Self { source_id, file_name })
    }

    /// Key for a file uploaded from the device identified by `device_name`.
    ///
    /// ```
    /// use medianorm_pipeline::UploadKey;
    ///
    /// let key = UploadKey::for_device("Device0", "20240707_121110.jpg", 8).unwrap();
    /// assert_eq!(key.to_string(), "devices/D5555C1A/20240707_121110.jpg");
    /// ```
    pub fn for_device(device_name: &str, file_name: impl Into<String>, id_length: usize) -> Result<Self> {
        let source_id = compute_source_id(device_name, id_length).or_raise(|| ErrorKind::Naming)?;
        Self::new(source_id, file_name)
    }

    /// Parses a storage path of the upload stage.
    pub fn parse(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = || ErrorKind::InvalidUploadKey(path.display().to_string());
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(s) => segments.push(s.to_str().ok_or_raise(invalid)?),
                Component::RootDir | Component::CurDir => {},
                _ => exn::bail!(invalid()),
            }
        }
        match segments.as_slice() {
            [DEVICES_PREFIX, source_id, file_name] => Self::new(*source_id, *file_name),
            _ => exn::bail!(invalid()),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path inside the upload stage.
    pub fn to_path(&self) -> PathBuf {
        [DEVICES_PREFIX, self.source_id.as_str(), self.file_name.as_str()].iter().collect()
    }

    /// Temporary path inside the upload stage, outside what processing lists.
    pub fn staging_path(&self) -> PathBuf {
        [STAGING_PREFIX, self.source_id.as_str(), self.file_name.as_str()].iter().collect()
    }

    /// Path inside the failed stage: `{source_id}/{file_name}`.
    pub fn failed_path(&self) -> PathBuf {
        [self.source_id.as_str(), self.file_name.as_str()].iter().collect()
    }
}
impl fmt::Display for UploadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DEVICES_PREFIX}/{}/{}", self.source_id, self.file_name)
    }
}
impl FromStr for UploadKey {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}
