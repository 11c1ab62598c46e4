use tracing::instrument;

use crate::consts::DEFAULT_FILE_INDEX;
use crate::error::Result;
use crate::extract::{extension, extract_index, extract_timestamp_str};
use crate::name::StandardizedFileName;
use crate::schema::FileNameSchema;
use crate::source::compute_source_id;

/// Builds the canonical name of `file_name` according to `schema`.
#[instrument(level = "trace", skip(schema, source_identifier), fields(schema = schema.name()))]
pub(crate) fn build(
    file_name: &str,
    schema: &FileNameSchema,
    source_identifier: &str,
    source_id_length: usize,
) -> Result<StandardizedFileName> {
    let timestamp_str = extract_timestamp_str(file_name, schema.timestamp_pattern())?;
    let timestamp = schema.timestamp_format().parse(timestamp_str)?;
    let sequence = match schema.index_pattern() {
        Some(pattern) => extract_index(file_name, pattern)?,
        None => DEFAULT_FILE_INDEX.to_string(),
    };
    let source = compute_source_id(source_identifier, source_id_length)?;
    Ok(StandardizedFileName::from_components(timestamp, source, sequence, extension(file_name)))
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{FileNameSchema, SchemaKind, standardize};
    use rstest::rstest;

    #[rstest]
    #[case("20240707_121110.jpg", SchemaKind::Android, "2024/07/20240707T121110_E3B0C442_0000.jpg")]
    #[case("IMG-20240721-WA0007.jpg", SchemaKind::WhatsApp, "2024/07/20240721T000000_E3B0C442_0007.jpg")]
    fn test_standardize_with_schema(#[case] file_name: &str, #[case] schema: SchemaKind, #[case] expected: &str) {
        let name = standardize(file_name, Some(schema.schema()), "").unwrap();
        assert_eq!(name.to_string(), expected);
    }

    #[test]
    fn test_standardize_with_schema_and_identifier() {
        let name = standardize("20240707_121110.jpg", Some(FileNameSchema::android()), "Device0").unwrap();
        assert_eq!(name.source, "D5555C1A");
        assert_eq!(name.to_string(), "2024/07/20240707T121110_D5555C1A_0000.jpg");
    }

    #[rstest]
    #[case("20240707_121110.jpg", "2024/07/20240707T121110_E3B0C442_0000.jpg")]
    #[case("20240707_121110.mp4", "2024/07/20240707T121110_E3B0C442_0000.mp4")]
    #[case("IMG-20240721-WA0007.jpg", "2024/07/20240721T000000_E3B0C442_0007.jpg")]
    #[case("VID-20240721-WA0007.mp4", "2024/07/20240721T000000_E3B0C442_0007.mp4")]
    fn test_standardize_with_schema_estimation(#[case] file_name: &str, #[case] expected: &str) {
        assert_eq!(standardize(file_name, None, "").unwrap().to_string(), expected);
    }

    #[test]
    fn test_standardize_unrecognized() {
        let err = standardize("IMG-20240721.jpg", None, "").unwrap_err();
        assert_eq!(*err, ErrorKind::UnrecognizedSchema("IMG-20240721.jpg".to_string()));
    }

    #[test]
    fn test_standardize_explicit_schema_missing_index() {
        // Not a WhatsApp name, but forced through the WhatsApp schema.
        let err = standardize("20240707_121110.jpg", Some(FileNameSchema::whatsapp()), "").unwrap_err();
        assert!(matches!(&*err, ErrorKind::IndexNotFound { .. }));
    }

    #[test]
    fn test_standardize_explicit_schema_missing_timestamp() {
        let err = standardize("IMG-WA0007.jpg", Some(FileNameSchema::whatsapp()), "").unwrap_err();
        assert!(matches!(&*err, ErrorKind::TimestampNotFound { .. }));
    }

    #[test]
    fn test_standardize_invalid_date() {
        let err = standardize("20241399_121110.jpg", None, "").unwrap_err();
        assert!(matches!(&*err, ErrorKind::TimestampParse { .. }));
    }

    #[test]
    fn test_extension_case_is_preserved() {
        let android = FileNameSchema::android();
        let name = standardize("20240707_121110.jpg", Some(android), "").unwrap();
        assert_eq!(name.extension, "jpg");
        // Only the lowercase extension classifies, but an explicit schema accepts any.
        let name = standardize("20240707_121110.JPG", Some(android), "").unwrap();
        assert_eq!(name.base_name(), "20240707T121110_E3B0C442_0000.JPG");
    }

    #[test]
    fn test_standardize_is_not_idempotent() {
        let canonical = standardize("20240707_121110.jpg", None, "").unwrap();
        // Canonical names don't belong to any input schema.
        assert!(standardize(&canonical.base_name(), None, "").is_err());
    }

    #[test]
    fn test_standardize_is_deterministic() {
        let a = standardize("VID-20240721-WA0007.mp4", None, "Pixel 8").unwrap();
        let b = standardize("VID-20240721-WA0007.mp4", None, "Pixel 8").unwrap();
        assert_eq!(a, b);
    }
}
