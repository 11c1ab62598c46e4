//! Processing of uploaded files.
//!
//! Each upload is standardized and moved to the processed stage under its
//! canonical name, or to the failed stage under `{source_id}/{file_name}` when
//! its name matches no schema. The primary entry point is [`process`], which
//! streams the [`Action`] taken for every upload via [`process_upload`].

mod file;
mod stream;

pub use self::file::{Action, process_upload};
pub use self::stream::{ProcessEvent, process};
