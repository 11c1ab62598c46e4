//! The staged media pipeline.
//!
//! Files move through three storage areas ([`Stages`]):
//!
//! 1. **upload**: raw files copied off a device, keyed
//!    `devices/{source_id}/{file_name}` (see [`upload_directory`]);
//! 2. **processed**: files whose names standardized, keyed by their canonical
//!    full path (see [`process`]);
//! 3. **failed**: files that didn't, keyed `{source_id}/{file_name}`.

pub mod device;
pub mod error;
mod key;
pub mod process;
mod upload;

pub use crate::key::{DEVICES_PREFIX, STAGING_PREFIX, UploadKey};
pub use crate::process::{Action, ProcessEvent, process, process_upload};
pub use crate::upload::{UploadEvent, upload_directory};
use medianorm_storage::BackendHandle;
use medianorm_storage::backend::ReadOnlyBackend;
use std::sync::Arc;

/// Maximum number of uploads processed concurrently.
pub const MAX_PROCESS_CONCURRENCY: usize = 16;

/// The storage areas of the pipeline.
///
/// Built once at startup from configuration and passed down; nothing in the
/// pipeline reaches for a global client.
#[derive(Clone)]
pub struct Stages {
    pub upload: BackendHandle,
    pub processed: BackendHandle,
    pub failed: BackendHandle,
}
impl Stages {
    pub fn new(upload: BackendHandle, processed: BackendHandle, failed: BackendHandle) -> Self {
        Self { upload, processed, failed }
    }

    /// The same stages with every mutation turned into a logged no-op.
    pub fn read_only(&self) -> Self {
        let wrap = |backend: &BackendHandle| -> BackendHandle { Arc::new(ReadOnlyBackend::new(Arc::clone(backend))) };
        Self {
            upload: wrap(&self.upload),
            processed: wrap(&self.processed),
            failed: wrap(&self.failed),
        }
    }
}
