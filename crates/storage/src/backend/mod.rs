//! The [`StorageBackend`] trait and its implementations.
//!
//! Each pipeline stage (upload, processed, failed) is one backend instance.
//! [`LocalBackend`] is the production backend; [`ReadOnlyBackend`] wraps any
//! other for dry runs.

mod local;
#[cfg(feature = "mock")]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::FileInfo;
use crate::error::Result;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// A flat keyspace of media files addressed by relative paths.
///
/// Every method is async so many uploads can be in flight at once.
///
/// # Path Handling
/// Paths are relative to the backend root. Implementations run each one
/// through [`validate_path`](crate::validate_path) and reject anything that
/// would escape the root.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use medianorm_storage::{backend::StorageBackend, error::Result};
///
/// async fn size_of_upload(backend: &dyn StorageBackend) -> Result<u64> {
///     let path = Path::new("devices/E3B0C442/20240707_121110.jpg");
///     match backend.exists(path).await? {
///         true => Ok(backend.stat(path).await?.size),
///         false => Ok(0),
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stage name shown in logs (`upload`, `processed`, ...).
    fn name(&self) -> &str;

    /// Every file under `prefix` (or the whole backend), collected from
    /// [`list_stream()`](Self::list_stream).
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Metadata of every file under `prefix`, yielded as it is found.
    ///
    /// Prefixes match whole path components, so `devices/E3` does not match
    /// `devices/E3B0C442`. A missing prefix is an empty listing.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// use std::path::Path;
    /// # use medianorm_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut uploads = backend.list_stream(Some(Path::new("devices")));
    /// while let Some(info) = uploads.try_next().await? {
    ///     println!("{}: {} bytes", info.path.display(), info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// `true` if a file is stored at `path`.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// The whole file, in memory.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Stores `data` at `path`, replacing whatever was there. Missing parent
    /// directories are created.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use medianorm_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// backend.write(Path::new("2024/07/20240707T121110_E3B0C442_0000.jpg"), b"...").await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Moves a file inside this backend, replacing any file at `to` and
    /// creating its parents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if `from` is
    /// missing.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Size and modification time, without reading the file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;
}
