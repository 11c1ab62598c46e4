//! Canonical naming of media files.
//!
//! Phones and messaging apps each name their media differently. This crate
//! recognizes the naming convention (schema) of a file name, pulls out its
//! capture time and sequence index, and renders a single canonical,
//! time-sortable name:
//!
//! ```text
//! YYYY/MM/YYYYMMDDThhmmss_SOURCE_SEQUENCE.ext
//! ```
//!
//! where `SOURCE` is a short hash of the device the file came from. Everything
//! except [`read_files_from_directory`] and [`standardize_directory`] is pure.

mod builder;
mod consts;
pub mod error;
mod extract;
mod name;
mod registry;
mod scan;
mod schema;
mod source;

use tracing::instrument;

pub use crate::consts::DEFAULT_FILE_INDEX;
use crate::error::Result;
pub use crate::extract::{TimestampFormat, extension, extract_index, extract_timestamp_str, parse_timestamp};
pub use crate::name::{Sequence, StandardizedFileName};
pub use crate::registry::{Registry, classify};
pub use crate::scan::{read_files_from_directory, standardize_directory};
pub use crate::schema::{FileNameSchema, SchemaKind};
pub use crate::source::{DEFAULT_SOURCE_ID_LENGTH, MAX_SOURCE_ID_LENGTH, compute_source_id};

/// Top-level entrypoint: standardizes a single file name.
///
/// When `schema` is `None` the name is classified against the built-in
/// schemas first. `source_identifier` is the raw device identifier; pass an
/// empty string when the source is unknown.
///
/// # Examples
///
/// ```
/// use medianorm_naming::standardize;
///
/// let name = standardize("IMG-20240721-WA0007.jpg", None, "").unwrap();
/// assert_eq!(name.to_string(), "2024/07/20240721T000000_E3B0C442_0007.jpg");
/// ```
#[instrument(level = "debug", skip(schema, source_identifier))]
pub fn standardize(
    file_name: &str,
    schema: Option<&FileNameSchema>,
    source_identifier: &str,
) -> Result<StandardizedFileName> {
    Registry::reference().standardize_as(file_name, schema, source_identifier)
}
