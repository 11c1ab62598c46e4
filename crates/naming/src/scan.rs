//! Directory scanning.
//!
//! The only part of the crate that touches the filesystem, and the only place
//! where a standardization failure is downgraded to a logged skip.

use exn::ResultExt;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::registry::Registry;

/// Lists the regular files directly inside `directory` (non-recursive).
///
/// With an allow-list, only names ending in one of `extensions` are kept; a
/// missing leading dot is added, and the comparison is case-sensitive. Hidden
/// files (leading dot) are never listed. Names that aren't valid UTF-8 are
/// listed like any other; they fail later, when a name has to be read.
/// The result is sorted and contains every file at most once.
///
/// # Errors
/// [`DirectoryListing`](ErrorKind::DirectoryListing) if the directory can't
/// be read.
#[instrument(skip(directory), fields(directory = %directory.as_ref().display()))]
pub fn read_files_from_directory(directory: impl AsRef<Path>, extensions: Option<&[&str]>) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    let error = || ErrorKind::DirectoryListing(directory.to_path_buf());
    let suffixes: Option<Vec<String>> = extensions.map(|extensions| {
        extensions
            .iter()
            .map(|ext| match ext.starts_with('.') {
                true => ext.to_string(),
                false => format!(".{ext}"),
            })
            .collect()
    });

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).or_raise(error)? {
        let path = entry.or_raise(error)?.path();
        // Follows symlinks; dangling links are not files.
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|name| name.as_encoded_bytes()) else {
            continue;
        };
        if name.starts_with(b".") {
            continue;
        }
        if let Some(suffixes) = &suffixes
            && !suffixes.iter().any(|suffix| name.ends_with(suffix.as_bytes()))
        {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Standardizes every qualifying file directly inside `directory` using the
/// reference registry.
///
/// Returns a map from original path to canonical full path. Files that fail
/// to standardize are logged at `warn` level and left out; only a failure to
/// list the directory fails the whole scan.
///
/// # Examples
///
/// ```no_run
/// use medianorm_naming::standardize_directory;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mapping = standardize_directory("/media/DCIM/Camera", Some(&[".jpg", ".mp4"]), "Pixel 8")?;
/// for (original, canonical) in &mapping {
///     println!("{} -> {canonical}", original.display());
/// }
/// # Ok(())
/// # }
/// ```
pub fn standardize_directory(
    directory: impl AsRef<Path>,
    extensions: Option<&[&str]>,
    source_identifier: &str,
) -> Result<BTreeMap<PathBuf, String>> {
    standardize_directory_with(Registry::reference(), directory.as_ref(), extensions, source_identifier)
}

pub(crate) fn standardize_directory_with(
    registry: &Registry,
    directory: &Path,
    extensions: Option<&[&str]>,
    source_identifier: &str,
) -> Result<BTreeMap<PathBuf, String>> {
    let mut standardized = BTreeMap::new();
    for path in read_files_from_directory(directory, extensions)? {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            tracing::warn!(file = %path.display(), "Skipping file with a non UTF-8 name");
            continue;
        };
        match registry.standardize(file_name, source_identifier) {
            Ok(name) => {
                tracing::debug!(file = file_name, canonical = %name, "Standardized file name");
                standardized.insert(path, name.full_path());
            },
            Err(err) => {
                let reason: &ErrorKind = &err;
                tracing::warn!(file = file_name, %reason, "Skipping file that could not be standardized");
            },
        }
    }
    Ok(standardized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, create_dir};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct Logs(Arc<Mutex<Vec<u8>>>);
    impl Logs {
        fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
            let subscriber = tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_max_level(tracing::Level::WARN)
                .with_ansi(false)
                .finish();
            tracing::subscriber::with_default(subscriber, f)
        }

        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }
    impl Write for Logs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    impl<'a> MakeWriter<'a> for Logs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn fixture(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            File::create(dir.path().join(file)).unwrap();
        }
        dir
    }

    #[test]
    fn test_read_files_from_directory() {
        let dir = fixture(&["20240724_182842.jpg", "IMG-unknown_schema.jpg", "VID-20240721-WA0000.mp4", "notes.txt"]);
        let files = read_files_from_directory(dir.path(), Some(&[".jpg", ".mp4"])).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("20240724_182842.jpg"),
                dir.path().join("IMG-unknown_schema.jpg"),
                dir.path().join("VID-20240721-WA0000.mp4"),
            ]
        );
    }

    #[test]
    fn test_read_files_without_allow_list() {
        let dir = fixture(&["a.jpg", "b.txt", "no_extension", ".hidden.jpg"]);
        create_dir(dir.path().join("nested.jpg")).unwrap();
        File::create(dir.path().join("nested.jpg").join("20240724_182842.jpg")).unwrap();
        let files = read_files_from_directory(dir.path(), None).unwrap();
        assert_eq!(files, vec![dir.path().join("a.jpg"), dir.path().join("b.txt"), dir.path().join("no_extension")]);
    }

    #[test]
    fn test_read_files_overlapping_extensions() {
        let dir = fixture(&["a.jpg", "b.JPG"]);
        let files = read_files_from_directory(dir.path(), Some(&["jpg", ".jpg", "pg"])).unwrap();
        assert_eq!(files, vec![dir.path().join("a.jpg")]);
    }

    #[test]
    fn test_read_files_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = read_files_from_directory(&missing, None).unwrap_err();
        assert_eq!(*err, ErrorKind::DirectoryListing(missing));
    }

    #[test]
    fn test_standardize_directory() {
        let dir = fixture(&["20240724_182842.jpg", "IMG-unknown_schema.jpg", "VID-20240721-WA0000.mp4"]);
        let mapping = standardize_directory(dir.path(), Some(&[".jpg", ".mp4"]), "").unwrap();
        let expected = BTreeMap::from([
            (dir.path().join("20240724_182842.jpg"), "2024/07/20240724T182842_E3B0C442_0000.jpg".to_string()),
            (dir.path().join("VID-20240721-WA0000.mp4"), "2024/07/20240721T000000_E3B0C442_0000.mp4".to_string()),
        ]);
        assert_eq!(mapping, expected);
    }

    #[test]
    fn test_standardize_directory_warns_on_skip() {
        let dir = fixture(&["20240724_182842.jpg", "IMG-unknown_schema.jpg", "VID-20240721-WA0000.mp4"]);
        let logs = Logs::default();
        let mapping = logs.capture(|| standardize_directory(dir.path(), Some(&[".jpg", ".mp4"]), "").unwrap());
        assert_eq!(mapping.len(), 2);
        let output = logs.contents();
        assert_eq!(output.matches(" WARN ").count(), 1);
        assert!(output.contains("Skipping file that could not be standardized"));
        assert!(output.contains("IMG-unknown_schema.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_listed_and_warned() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = fixture(&["20240707_121110.jpg"]);
        let odd = dir.path().join(OsStr::from_bytes(b"20240707_121110\xff.jpg"));
        File::create(&odd).unwrap();

        assert_eq!(read_files_from_directory(dir.path(), None).unwrap().len(), 2);
        let listed = read_files_from_directory(dir.path(), Some(&[".jpg"])).unwrap();
        assert!(listed.contains(&odd));

        let logs = Logs::default();
        let mapping = logs.capture(|| standardize_directory(dir.path(), Some(&[".jpg"]), "").unwrap());
        assert_eq!(mapping.len(), 1);
        let output = logs.contents();
        assert_eq!(output.matches(" WARN ").count(), 1);
        assert!(output.contains("Skipping file with a non UTF-8 name"));
    }

    #[test]
    fn test_standardize_directory_with_source() {
        let dir = fixture(&["20240707_121110.jpg"]);
        let mapping = standardize_directory(dir.path(), None, "Device0").unwrap();
        assert_eq!(
            mapping.get(&dir.path().join("20240707_121110.jpg")).map(String::as_str),
            Some("2024/07/20240707T121110_D5555C1A_0000.jpg")
        );
    }

    #[test]
    fn test_standardize_directory_with_registry() {
        let screenshots = crate::FileNameSchema::new(
            "screenshot",
            r"^Screenshot_\d{8}-\d{6}",
            r"\d{8}-\d{6}",
            "[year][month][day]-[hour][minute][second]",
            None,
        )
        .unwrap();
        let registry = Registry::default().with_schema(screenshots);
        let dir = fixture(&["Screenshot_20240101-090000.png", "IMG-20240721.jpg"]);
        let mapping = registry.standardize_directory(dir.path(), None, "").unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(
            mapping.values().next().map(String::as_str),
            Some("2024/01/20240101T090000_E3B0C442_0000.png")
        );
    }

    #[test]
    fn test_standardize_empty_directory() {
        let dir = fixture(&[]);
        assert!(standardize_directory(dir.path(), None, "").unwrap().is_empty());
    }
}
