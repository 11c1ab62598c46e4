//! Discovery of an Android device mounted over MTP by gvfs.
//!
//! A connected phone shows up as `{gvfs}/mtp:host={identifier}`, with its
//! storage one level further down (named after the phone's locale, e.g.
//! `Interner Speicher`). The media folders worth uploading sit at fixed paths
//! below that; see [`MediaDirectory`].

use crate::error::{Error, ErrorKind, Result};
use exn::OptionExt;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

const MTP_PREFIX: &str = "mtp:";
static DEVICE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new("mtp:host=([^/]+)").unwrap());

/// Returns the single MTP mount inside `gvfs`.
///
/// A missing or unreadable `gvfs` directory counts as no device.
pub fn find_mtp_mount(gvfs: impl AsRef<Path>) -> Result<PathBuf> {
    let gvfs = gvfs.as_ref();
    let mounts: Vec<PathBuf> = match fs::read_dir(gvfs) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_str().is_some_and(|name| name.starts_with(MTP_PREFIX)))
            .map(|entry| entry.path())
            .collect(),
        Err(e) => {
            tracing::debug!(gvfs = %gvfs.display(), error = %e, "Cannot read gvfs directory");
            Vec::new()
        },
    };
    match mounts.len() {
        0 => exn::bail!(ErrorKind::NoDevice(gvfs.to_path_buf())),
        1 => Ok(mounts.into_iter().next().ok_or_raise(|| ErrorKind::NoDevice(gvfs.to_path_buf()))?),
        n => exn::bail!(ErrorKind::MultipleDevices(n)),
    }
}

/// Extracts the device identifier from an MTP mount path.
///
/// ```
/// # use medianorm_pipeline::device::device_identifier;
/// let mount = "/run/user/1000/gvfs/mtp:host=SAMSUNG_SAMSUNG_Android_RFCW112HFCK";
/// assert_eq!(device_identifier(mount).unwrap(), "SAMSUNG_SAMSUNG_Android_RFCW112HFCK");
/// ```
pub fn device_identifier(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    path.to_str()
        .and_then(|p| DEVICE_IDENTIFIER.captures(p))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_raise(|| ErrorKind::NoDeviceIdentifier(path.to_path_buf()))
}

/// The internal storage folder of a mounted device.
///
/// Fails with [`NoInternalStorage`](ErrorKind::NoInternalStorage) when the
/// folder isn't visible, which is what a locked phone looks like.
pub fn internal_storage(mount: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
    let path = mount.as_ref().join(name);
    if !path.is_dir() {
        exn::bail!(ErrorKind::NoInternalStorage(path));
    }
    Ok(path)
}

/// Well-known media folders on an Android device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDirectory {
    WhatsAppImages,
    WhatsAppVideos,
    Dcim,
    Camera,
}
impl MediaDirectory {
    pub const ALL: [Self; 4] = [Self::WhatsAppImages, Self::WhatsAppVideos, Self::Dcim, Self::Camera];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhatsAppImages => "whatsapp-images",
            Self::WhatsAppVideos => "whatsapp-videos",
            Self::Dcim => "dcim",
            Self::Camera => "camera",
        }
    }

    /// Location relative to the internal storage folder.
    pub fn relative_path(&self) -> &'static Path {
        Path::new(match self {
            Self::WhatsAppImages => "Android/media/com.whatsapp/WhatsApp/Media/WhatsApp Images",
            Self::WhatsAppVideos => "Android/media/com.whatsapp/WhatsApp/Media/WhatsApp Video",
            Self::Dcim => "DCIM",
            Self::Camera => "DCIM/Camera",
        })
    }

    pub fn resolve(&self, internal_storage: impl AsRef<Path>) -> PathBuf {
        internal_storage.as_ref().join(self.relative_path())
    }
}
impl fmt::Display for MediaDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for MediaDirectory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|dir| dir.as_str() == s)
            .ok_or_raise(|| ErrorKind::UnknownMediaDirectory(s.to_string()))
    }
}
