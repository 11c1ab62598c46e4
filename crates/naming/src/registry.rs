//! Ordered schema registry and classification.

use exn::OptionExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::name::StandardizedFileName;
use crate::schema::{FileNameSchema, SchemaKind};
use crate::source::{self, DEFAULT_SOURCE_ID_LENGTH};
use crate::{builder, scan};

static REFERENCE: LazyLock<Registry> = LazyLock::new(Registry::default);

/// An ordered list of schemas; classification returns the first match.
///
/// Registration order is part of the contract: patterns are not mutually
/// exclusive, so callers relying on ambiguous names depend on it. The
/// reference registry holds the built-in schemas (Android first, WhatsApp
/// second); configured schemas are appended after them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    schemas: Vec<FileNameSchema>,
    source_id_length: usize,
}
impl Default for Registry {
    fn default() -> Self {
        Self::new(SchemaKind::ALL.into_iter().map(|kind| kind.schema().clone()))
    }
}
impl Registry {
    pub fn new(schemas: impl IntoIterator<Item = FileNameSchema>) -> Self {
        Self {
            schemas: schemas.into_iter().collect(),
            source_id_length: DEFAULT_SOURCE_ID_LENGTH,
        }
    }

    /// The built-in schemas with default settings.
    pub fn reference() -> &'static Self {
        &REFERENCE
    }

    /// Appends a schema with the lowest priority.
    #[must_use]
    pub fn with_schema(mut self, schema: FileNameSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Changes the number of hex characters in generated source ids.
    pub fn with_source_id_length(mut self, length: usize) -> Result<Self> {
        if !source::valid_length(length) {
            exn::bail!(ErrorKind::InvalidSourceIdLength(length));
        }
        self.source_id_length = length;
        Ok(self)
    }

    pub fn schemas(&self) -> &[FileNameSchema] {
        &self.schemas
    }

    pub fn source_id_length(&self) -> usize {
        self.source_id_length
    }

    /// Looks up a registered schema by name.
    pub fn get(&self, name: &str) -> Option<&FileNameSchema> {
        self.schemas.iter().find(|schema| schema.name() == name)
    }

    /// Returns the first registered schema whose pattern matches `file_name`.
    ///
    /// # Errors
    /// [`UnrecognizedSchema`](ErrorKind::UnrecognizedSchema) if none match.
    ///
    /// # Examples
    ///
    /// ```
    /// use medianorm_naming::{FileNameSchema, Registry};
    ///
    /// let registry = Registry::reference();
    /// assert_eq!(registry.classify("20240721_121233.jpg").unwrap(), FileNameSchema::android());
    /// assert_eq!(registry.classify("IMG-20240721-WA0007.jpg").unwrap(), FileNameSchema::whatsapp());
    /// assert!(registry.classify("IMG-20240721.jpg").is_err());
    /// ```
    #[instrument(level = "trace", skip(self))]
    pub fn classify(&self, file_name: &str) -> Result<&FileNameSchema> {
        self.schemas
            .iter()
            .find(|schema| schema.matches(file_name))
            .ok_or_raise(|| ErrorKind::UnrecognizedSchema(file_name.to_string()))
    }

    /// Classifies `file_name` against this registry, then standardizes it.
    pub fn standardize(&self, file_name: &str, source_identifier: &str) -> Result<StandardizedFileName> {
        self.standardize_as(file_name, None, source_identifier)
    }

    /// Standardizes `file_name` with an explicit schema, or classifies it
    /// against this registry when `schema` is `None`.
    pub fn standardize_as(
        &self,
        file_name: &str,
        schema: Option<&FileNameSchema>,
        source_identifier: &str,
    ) -> Result<StandardizedFileName> {
        let schema = match schema {
            Some(schema) => schema,
            None => self.classify(file_name)?,
        };
        builder::build(file_name, schema, source_identifier, self.source_id_length)
    }

    /// Standardizes every qualifying file directly inside `directory`.
    ///
    /// See [`standardize_directory`](crate::standardize_directory).
    pub fn standardize_directory(
        &self,
        directory: impl AsRef<Path>,
        extensions: Option<&[&str]>,
        source_identifier: &str,
    ) -> Result<BTreeMap<PathBuf, String>> {
        scan::standardize_directory_with(self, directory.as_ref(), extensions, source_identifier)
    }
}

/// Classifies `file_name` against the reference registry.
pub fn classify(file_name: &str) -> Result<&'static FileNameSchema> {
    Registry::reference().classify(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("IMG-20240721-WA0007.jpg", SchemaKind::WhatsApp)]
    #[case("VID-20240721-WA0007.mp4", SchemaKind::WhatsApp)]
    #[case("20240721_121233.jpg", SchemaKind::Android)]
    #[case("20240721_121233.mp4", SchemaKind::Android)]
    fn test_classify(#[case] file_name: &str, #[case] expected: SchemaKind) {
        assert_eq!(classify(file_name).unwrap(), expected.schema());
    }

    #[rstest]
    #[case("IMG-20240721.jpg")]
    #[case("holiday.jpg")]
    #[case("IMG-20240721-WA0007.png")]
    #[case("")]
    fn test_classify_unrecognized(#[case] file_name: &str) {
        let err = classify(file_name).unwrap_err();
        assert_eq!(*err, ErrorKind::UnrecognizedSchema(file_name.to_string()));
    }

    #[test]
    fn test_first_registered_match_wins() {
        // Matches both the Android pattern and the catch-all below.
        let catch_all = FileNameSchema::new("catch-all", r"\.jpg$", r"\d{8}", "[year][month][day]", None).unwrap();
        let registry = Registry::default().with_schema(catch_all.clone());
        assert_eq!(registry.classify("20240721_121233.jpg").unwrap(), FileNameSchema::android());
        assert_eq!(registry.classify("scan 20240721.jpg").unwrap(), &catch_all);

        let reordered = Registry::new([catch_all.clone(), FileNameSchema::android().clone()]);
        assert_eq!(reordered.classify("20240721_121233.jpg").unwrap(), &catch_all);
    }

    #[test]
    fn test_get_by_name() {
        let registry = Registry::reference();
        assert_eq!(registry.get("whatsapp"), Some(FileNameSchema::whatsapp()));
        assert_eq!(registry.get("telegram"), None);
        assert_eq!(registry.schemas().len(), 2);
    }

    #[test]
    fn test_source_id_length() {
        let registry = Registry::default().with_source_id_length(12).unwrap();
        let name = registry.standardize("20240707_121110.jpg", "").unwrap();
        assert_eq!(name.source, "E3B0C44298FC");
        assert!(Registry::default().with_source_id_length(65).is_err());
        let err = Registry::default().with_source_id_length(0).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidSourceIdLength(0));
    }
}
