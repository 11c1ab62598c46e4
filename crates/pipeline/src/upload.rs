use crate::Stages;
use crate::error::{Error, ErrorKind, Result};
use crate::key::UploadKey;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use medianorm_naming::{compute_source_id, read_files_from_directory};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Progress events emitted by [`upload_directory`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of files found.
/// 3. [`Uploaded`](Self::Uploaded) or [`Skipped`](Self::Skipped): once per
///    file that didn't fail.
/// 4. [`Complete`](Self::Complete): exactly once.
///
/// A discovery failure terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Started,
    DiscoveryComplete(u64),
    /// The file was written to the upload stage.
    Uploaded(UploadKey),
    /// The upload stage already held this key; nothing was written.
    Skipped(UploadKey),
    Complete,
}

/// Copies every qualifying file directly inside `directory` into the upload
/// stage under `devices/{source_id}/{file_name}`.
///
/// `source_id` is computed from `device_name` with `id_length` hex
/// characters. Files are listed like the naming scanner lists them (same
/// extension allow-list semantics). Existing keys are never overwritten.
/// Each file is written under `incoming/` first and renamed into place.
/// Per-file failures are yielded as `Err` items without ending the stream.
pub fn upload_directory<'a>(
    stages: &'a Stages,
    directory: &'a Path,
    extensions: Option<&'a [&'a str]>,
    device_name: &'a str,
    id_length: usize,
) -> impl Stream<Item = Result<UploadEvent>> + 'a {
    stream!({
        yield Ok(UploadEvent::Started);

        let source_id = match compute_source_id(device_name, id_length).or_raise(|| ErrorKind::Naming) {
            Ok(id) => id,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let files = match list(directory, extensions).await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield Ok(UploadEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(0)));
        tracing::info!(directory = %directory.display(), source_id = %source_id, files = files.len(), "Uploading directory");

        for file in files {
            yield upload_file(stages, &source_id, &file).await;
        }

        yield Ok(UploadEvent::Complete);
    })
}

/// Lists on the blocking pool; device mounts can be slow to enumerate.
async fn list(directory: &Path, extensions: Option<&[&str]>) -> Result<Vec<PathBuf>> {
    let owned_directory = directory.to_path_buf();
    let owned_extensions: Option<Vec<String>> = extensions.map(|e| e.iter().map(|s| s.to_string()).collect());
    tokio::task::spawn_blocking(move || {
        let extensions: Option<Vec<&str>> = owned_extensions.as_ref().map(|e| e.iter().map(String::as_str).collect());
        read_files_from_directory(&owned_directory, extensions.as_deref())
    })
    .await
    .or_raise(|| ErrorKind::Io(directory.to_path_buf()))?
    .or_raise(|| ErrorKind::Io(directory.to_path_buf()))
}

async fn upload_file(stages: &Stages, source_id: &str, file: &Path) -> Result<UploadEvent> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::from(ErrorKind::Io(file.to_path_buf())))?;
    let key = UploadKey::new(source_id, file_name)?;
    let path = key.to_path();
    if stages.upload.exists(&path).await.or_raise(|| ErrorKind::Storage)? {
        tracing::info!(%key, "Upload already exists, skipping");
        return Ok(UploadEvent::Skipped(key));
    }
    let data = fs::read(file).await.or_raise(|| ErrorKind::Io(file.to_path_buf()))?;
    // Publish with a rename so processing never lists a partial write.
    let staging = key.staging_path();
    stages.upload.write(&staging, &data).await.or_raise(|| ErrorKind::Storage)?;
    stages.upload.rename(&staging, &path).await.or_raise(|| ErrorKind::Storage)?;
    tracing::info!(source = %file.display(), %key, bytes = data.len(), "Uploaded file");
    Ok(UploadEvent::Uploaded(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use medianorm_storage::StorageBackend;
    use medianorm_storage::backend::MockBackend;
    use std::sync::Arc;

    fn stages() -> (Arc<MockBackend>, Stages) {
        let upload = Arc::new(MockBackend::default().with_name("upload"));
        let stages = Stages::new(
            upload.clone(),
            Arc::new(MockBackend::default().with_name("processed")),
            Arc::new(MockBackend::default().with_name("failed")),
        );
        (upload, stages)
    }

    #[tokio::test]
    async fn test_upload_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20240707_121110.jpg"), b"android").unwrap();
        std::fs::write(dir.path().join("IMG-20240721-WA0007.jpg"), b"whatsapp").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        let (upload, stages) = stages();

        let events: Vec<_> =
            upload_directory(&stages, dir.path(), Some(&[".jpg", ".mp4"]), "Device0", 8).try_collect().await.unwrap();
        let key = |name: &str| UploadKey::new("D5555C1A", name).unwrap();
        assert_eq!(
            events,
            vec![
                UploadEvent::Started,
                UploadEvent::DiscoveryComplete(2),
                UploadEvent::Uploaded(key("20240707_121110.jpg")),
                UploadEvent::Uploaded(key("IMG-20240721-WA0007.jpg")),
                UploadEvent::Complete,
            ]
        );
        assert_eq!(
            upload.read(Path::new("devices/D5555C1A/20240707_121110.jpg")).await.unwrap(),
            b"android"
        );
        assert_eq!(
            upload.paths().await,
            vec![
                PathBuf::from("devices/D5555C1A/20240707_121110.jpg"),
                PathBuf::from("devices/D5555C1A/IMG-20240721-WA0007.jpg"),
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_keys_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20240707_121110.jpg"), b"new").unwrap();
        let (upload, stages) = stages();
        upload.write(Path::new("devices/E3B0C442/20240707_121110.jpg"), b"old").await.unwrap();

        let events: Vec<_> = upload_directory(&stages, dir.path(), None, "", 8).try_collect().await.unwrap();
        let key = UploadKey::new("E3B0C442", "20240707_121110.jpg").unwrap();
        assert_eq!(events[2], UploadEvent::Skipped(key));
        assert_eq!(upload.read(Path::new("devices/E3B0C442/20240707_121110.jpg")).await.unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_zero_id_length_ends_stream() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20240707_121110.jpg"), b"android").unwrap();
        let (upload, stages) = stages();
        let results: Vec<_> = futures::StreamExt::collect(upload_directory(&stages, dir.path(), None, "Device0", 0)).await;
        assert_eq!(results.len(), 2);
        assert!(matches!(&results[1], Err(e) if matches!(&**e, ErrorKind::Naming)));
        assert!(upload.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_ends_stream() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("DCIM");
        let (_upload, stages) = stages();
        let results: Vec<_> = futures::StreamExt::collect(upload_directory(&stages, &missing, None, "", 8)).await;
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Ok(UploadEvent::Started)));
        assert!(matches!(&results[1], Err(e) if matches!(&**e, ErrorKind::Io(_))));
    }
}
