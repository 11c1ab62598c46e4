use crate::error::{ErrorKind, Result};
use crate::key::{DEVICES_PREFIX, UploadKey};
use crate::process::file::{Action, process_upload};
use crate::{MAX_PROCESS_CONCURRENCY, Stages};
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use medianorm_naming::Registry;
use std::path::Path;

/// Progress events emitted by [`process`] as it works through the upload
/// stage.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of uploads found.
/// 3. [`Processed`](Self::Processed): zero or more times, one per upload.
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// A listing error terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// Processing has begun; emitted exactly once before any other event.
    Started,
    /// The upload stage has been listed; the total count is now known.
    DiscoveryComplete(u64),
    /// An upload has been moved out of the upload stage.
    Processed(Action),
    /// Every discovered upload has been handled; the stream is finished.
    Complete,
}

/// Streams [`ProcessEvent`]s for every object under `devices/` in the upload
/// stage, handing each one to [`process_upload`].
///
/// Uploads are processed concurrently, up to `MAX_PROCESS_CONCURRENCY` at a
/// time; additional uploads are promoted as in-flight ones complete, so
/// `Processed` events arrive in completion order. Individual failures
/// (including objects that aren't valid upload keys) are surfaced as `Err`
/// items without terminating the stream. Only a listing failure is fatal.
pub fn process<'a>(stages: &'a Stages, registry: &'a Registry) -> impl Stream<Item = Result<ProcessEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(ProcessEvent::Started);

        let files = match stages.upload.list(Some(Path::new(DEVICES_PREFIX))).await.or_raise(|| ErrorKind::Storage) {
            Ok(f) => f,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield Ok(ProcessEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(0)));

        let mut keys = Vec::with_capacity(files.len());
        for file in files {
            match UploadKey::parse(&file.path) {
                Ok(key) => keys.push(key),
                Err(e) => {
                    tracing::warn!(path = %file.path.display(), "Ignoring object outside the upload key layout");
                    yield Err(e);
                },
            }
        }

        let mut futures: Vec<_> =
            keys.into_iter().map(|key| async move { process_upload(stages, registry, &key).await }).collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(futures.drain(..MAX_PROCESS_CONCURRENCY.min(futures.len())));
        while let Some(result) = processing.next().await {
            yield result.map(ProcessEvent::Processed);
            // Pop-n-push, but FIFO instead of LIFO.
            if !futures.is_empty() {
                processing.push(futures.remove(0));
            }
        }

        yield Ok(ProcessEvent::Complete);
    })
}
