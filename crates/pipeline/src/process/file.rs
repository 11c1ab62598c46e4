use crate::Stages;
use crate::error::{ErrorKind, Result};
use crate::key::UploadKey;
use exn::ResultExt;
use medianorm_naming::Registry;
use medianorm_storage::BackendHandle;
use medianorm_storage::error::ErrorKind as StorageErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// The outcome of (successfully) processing a single upload.
///
/// Each variant carries the path the content now lives at, inside the stage
/// the variant names. The upload itself is gone in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Moved to the processed stage under its canonical name.
    Processed(PathBuf),
    /// Name matched no schema; moved to the failed stage.
    Failed(PathBuf),
    /// The target already held identical bytes; the upload was dropped.
    Duplicate(PathBuf),
}
impl Action {
    pub fn path(&self) -> &Path {
        match self {
            Self::Processed(path) | Self::Failed(path) | Self::Duplicate(path) => path,
        }
    }
}

/// Moves one upload to its processed or failed location.
///
/// The file name is standardized against `registry`, keeping the source id
/// already present in the key. Standardization failures are not errors: they
/// route the file to the failed stage under `{source_id}/{file_name}`.
///
/// When the target is occupied, identical content (BLAKE3) counts as done and
/// the upload is dropped; different content raises
/// [`Conflict`](ErrorKind::Conflict) and leaves the upload in place.
#[instrument(level = "debug", skip(stages, registry, key), fields(key = %key))]
pub async fn process_upload(stages: &Stages, registry: &Registry, key: &UploadKey) -> Result<Action> {
    let (target, path, processed) = match registry.standardize(key.file_name(), "") {
        Ok(name) => {
            let name = name.with_source(key.source_id());
            (&stages.processed, PathBuf::from(name.full_path()), true)
        },
        Err(err) => {
            let reason: &medianorm_naming::error::ErrorKind = &err;
            tracing::warn!(%key, %reason, "Could not standardize upload, routing to failed stage");
            (&stages.failed, key.failed_path(), false)
        },
    };

    let upload_path = key.to_path();
    let data = stages.upload.read(&upload_path).await.or_raise(|| ErrorKind::Storage)?;
    if is_duplicate(target, &path, &data).await? {
        stages.upload.delete(&upload_path).await.or_raise(|| ErrorKind::Storage)?;
        tracing::info!(%key, target = %path.display(), "Identical file already stored, dropped upload");
        return Ok(Action::Duplicate(path));
    }

    target.write(&path, &data).await.or_raise(|| ErrorKind::Storage)?;
    stages.upload.delete(&upload_path).await.or_raise(|| ErrorKind::Storage)?;
    tracing::info!(%key, stage = target.name(), target = %path.display(), "Moved upload");
    Ok(match processed {
        true => Action::Processed(path),
        false => Action::Failed(path),
    })
}

/// `Ok(true)` if `path` holds exactly `data`, `Ok(false)` if it's free.
async fn is_duplicate(target: &BackendHandle, path: &Path, data: &[u8]) -> Result<bool> {
    let info = match target.stat(path).await {
        Ok(info) => info,
        Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => return Ok(false),
        Err(e) => Err(e).or_raise(|| ErrorKind::Storage)?,
    };
    // Different sizes can't be the same content; skip reading the target.
    if usize::try_from(info.size).ok() != Some(data.len()) {
        exn::bail!(ErrorKind::Conflict(path.to_path_buf()));
    }
    let existing = target.read(path).await.or_raise(|| ErrorKind::Storage)?;
    if blake3::hash(&existing) != blake3::hash(data) {
        exn::bail!(ErrorKind::Conflict(path.to_path_buf()));
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medianorm_storage::StorageBackend;
    use medianorm_storage::backend::MockBackend;
    use std::sync::Arc;

    struct Fixture {
        upload: Arc<MockBackend>,
        processed: Arc<MockBackend>,
        failed: Arc<MockBackend>,
        stages: Stages,
    }

    fn fixture(uploads: &[(&str, &str)]) -> Fixture {
        let upload = Arc::new(MockBackend::with_files(uploads.iter().map(|(p, d)| (*p, d.as_bytes().to_vec()))));
        let processed = Arc::new(MockBackend::default().with_name("processed"));
        let failed = Arc::new(MockBackend::default().with_name("failed"));
        let stages = Stages::new(upload.clone(), processed.clone(), failed.clone());
        Fixture { upload, processed, failed, stages }
    }

    #[tokio::test]
    async fn test_process_android_upload() {
        let f = fixture(&[("devices/D5555C1A/20240707_121110.jpg", "jpeg")]);
        let key = UploadKey::parse("devices/D5555C1A/20240707_121110.jpg").unwrap();
        let action = process_upload(&f.stages, Registry::reference(), &key).await.unwrap();
        let expected = PathBuf::from("2024/07/20240707T121110_D5555C1A_0000.jpg");
        assert_eq!(action, Action::Processed(expected.clone()));
        assert_eq!(f.processed.read(&expected).await.unwrap(), b"jpeg");
        assert!(f.upload.paths().await.is_empty());
        assert!(f.failed.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_process_keeps_key_source_id() {
        // The key's source id is not a device name and must not be re-hashed.
        let f = fixture(&[("devices/78FCB7B4/IMG-20240721-WA0007.jpg", "jpeg")]);
        let key = UploadKey::parse("devices/78FCB7B4/IMG-20240721-WA0007.jpg").unwrap();
        let action = process_upload(&f.stages, Registry::reference(), &key).await.unwrap();
        assert_eq!(action.path(), Path::new("2024/07/20240721T000000_78FCB7B4_0007.jpg"));
    }

    #[tokio::test]
    async fn test_process_unrecognized_upload() {
        let f = fixture(&[("devices/E3B0C442/holiday.jpg", "jpeg")]);
        let key = UploadKey::new("E3B0C442", "holiday.jpg").unwrap();
        let action = process_upload(&f.stages, Registry::reference(), &key).await.unwrap();
        assert_eq!(action, Action::Failed(PathBuf::from("E3B0C442/holiday.jpg")));
        assert_eq!(f.failed.read(Path::new("E3B0C442/holiday.jpg")).await.unwrap(), b"jpeg");
        assert!(f.upload.paths().await.is_empty());
        assert!(f.processed.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_process_duplicate() {
        let f = fixture(&[("devices/E3B0C442/20240707_121110.jpg", "jpeg")]);
        let target = Path::new("2024/07/20240707T121110_E3B0C442_0000.jpg");
        f.processed.write(target, b"jpeg").await.unwrap();
        let key = UploadKey::new("E3B0C442", "20240707_121110.jpg").unwrap();
        let action = process_upload(&f.stages, Registry::reference(), &key).await.unwrap();
        assert_eq!(action, Action::Duplicate(target.to_path_buf()));
        assert!(f.upload.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_process_conflict() {
        let f = fixture(&[("devices/E3B0C442/20240707_121110.jpg", "new")]);
        let target = Path::new("2024/07/20240707T121110_E3B0C442_0000.jpg");
        f.processed.write(target, b"old").await.unwrap();
        let key = UploadKey::new("E3B0C442", "20240707_121110.jpg").unwrap();
        let err = process_upload(&f.stages, Registry::reference(), &key).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(p) if p == target));
        // Nothing moved.
        assert_eq!(f.processed.read(target).await.unwrap(), b"old");
        assert_eq!(f.upload.paths().await.len(), 1);
    }

    #[tokio::test]
    async fn test_process_conflict_same_size() {
        let f = fixture(&[("devices/E3B0C442/20240707_121110.jpg", "abc")]);
        let target = Path::new("2024/07/20240707T121110_E3B0C442_0000.jpg");
        f.processed.write(target, b"xyz").await.unwrap();
        let key = UploadKey::new("E3B0C442", "20240707_121110.jpg").unwrap();
        let err = process_upload(&f.stages, Registry::reference(), &key).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));
        assert_eq!(f.upload.paths().await.len(), 1);
    }

    #[tokio::test]
    async fn test_process_missing_upload() {
        let f = fixture(&[]);
        let key = UploadKey::new("E3B0C442", "20240707_121110.jpg").unwrap();
        let err = process_upload(&f.stages, Registry::reference(), &key).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
    }

    #[tokio::test]
    async fn test_process_dry_run() {
        let f = fixture(&[("devices/E3B0C442/20240707_121110.jpg", "jpeg")]);
        let stages = f.stages.read_only();
        let key = UploadKey::new("E3B0C442", "20240707_121110.jpg").unwrap();
        let action = process_upload(&stages, Registry::reference(), &key).await.unwrap();
        assert!(matches!(action, Action::Processed(_)));
        assert_eq!(f.upload.paths().await.len(), 1);
        assert!(f.processed.paths().await.is_empty());
    }
}
