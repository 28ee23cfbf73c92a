//! Public handle over one chunked upload session

use log::{info, warn};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use super::chunk::ChunkPlan;
use super::config::UploadOptions;
use super::digest::ContentDigest;
use super::error::UploadError;
use super::session::SessionState;
use super::source::ChunkSource;
use super::transport::ChunkTransport;
use super::types::{UploadCallbacks, UploadChunkError, UploadStatus};
use super::worker::{drive, run_digest, DigestState, Shared};

/// Handle to a running upload.
///
/// Dropping the handle does not stop the upload; call [`abort`](Self::abort)
/// for that.
pub struct ChunkUploader {
    shared: Arc<Shared>,
    runtime: Handle,
    digest_task: AbortHandle,
}

impl ChunkUploader {
    /// Validate the options, then start hashing and uploading concurrently.
    ///
    /// Validation failures are reported on the error callback and returned
    /// as `VALIDATION_FAILED`.
    ///
    /// Must be called from within a Tokio runtime. Calling it outside one is
    /// a caller error: nothing is spawned, and it is reported the same way
    /// since the error taxonomy has no separate environment code.
    pub fn start(
        source: Arc<dyn ChunkSource>,
        options: UploadOptions,
        transport: Arc<dyn ChunkTransport>,
        digest: Arc<dyn ContentDigest>,
        callbacks: UploadCallbacks,
    ) -> Result<Self, UploadChunkError> {
        let checked = match Self::check(source.as_ref(), &options) {
            Ok(checked) => checked,
            Err(err) => {
                let payload = UploadChunkError::validation(err.to_string());
                warn!("upload_start: {} rejected: {}", source.name(), err);
                (callbacks.on_error)(payload.clone());
                return Err(payload);
            }
        };
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                let payload = UploadChunkError::validation(format!(
                    "start must be called within a tokio runtime: {}",
                    e
                ));
                warn!("upload_start: {} rejected: {}", source.name(), payload.message);
                (callbacks.on_error)(payload.clone());
                return Err(payload);
            }
        };

        let plan = ChunkPlan::new(source.size(), checked.chunk_size);
        info!(
            "upload_start: {} ({} bytes, {} chunks of {} bytes, {} retries) -> {}",
            source.name(),
            plan.file_size(),
            plan.total_chunks(),
            plan.chunk_size(),
            checked.max_retries,
            checked.endpoint
        );

        let state = SessionState::new(checked.endpoint, plan, checked.max_retries);
        let (digest_tx, digest_rx) = watch::channel(DigestState::Pending);
        let shared = Arc::new(Shared::new(state, source, transport, callbacks, digest_rx));

        (shared.callbacks.on_progress)(plan.percent(0));

        let digest_task = runtime
            .spawn(run_digest(shared.clone(), digest, digest_tx))
            .abort_handle();
        runtime.spawn(drive(shared.clone()));

        Ok(Self {
            shared,
            runtime,
            digest_task,
        })
    }

    fn check(
        source: &dyn ChunkSource,
        options: &UploadOptions,
    ) -> Result<super::config::ValidatedOptions, UploadError> {
        let checked = options.validate()?;
        if source.size() == 0 {
            return Err(UploadError::Validation("cannot upload empty file".into()));
        }
        Ok(checked)
    }

    /// Stop after the in-flight chunk resolves
    pub fn pause(&self) {
        if self.shared.lock().pause() {
            info!("upload_pause: {}", self.shared.source.name());
        }
    }

    /// Continue at the current chunk; no-op unless paused
    pub fn resume(&self) {
        let (resumed, spawn) = {
            let mut state = self.shared.lock();
            let was_paused = state.paused && !state.completed && !state.aborted;
            (was_paused, state.resume())
        };
        if !resumed {
            warn!(
                "upload_resume: {} ignored in state {}",
                self.shared.source.name(),
                self.status()
            );
            return;
        }
        info!(
            "upload_resume: {} at chunk {}",
            self.shared.source.name(),
            self.current_chunk() + 1
        );
        if spawn {
            self.runtime.spawn(drive(self.shared.clone()));
        }
    }

    /// Stop for good; later `resume` calls are ignored
    pub fn abort(&self) {
        if self.shared.lock().abort() {
            self.digest_task.abort();
            info!("upload_abort: {}", self.shared.source.name());
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.shared.lock().status()
    }

    /// Percent of chunks fully sent
    pub fn progress(&self) -> f64 {
        let state = self.shared.lock();
        state.plan.percent(state.current_chunk)
    }

    /// 0-based index of the next chunk to send
    pub fn current_chunk(&self) -> u64 {
        self.shared.lock().current_chunk
    }

    pub fn total_chunks(&self) -> u64 {
        self.shared.plan.total_chunks()
    }

    /// Endpoint the next chunk will be sent to
    pub fn endpoint(&self) -> String {
        self.shared.lock().endpoint.clone()
    }

    pub fn retry_count(&self) -> u32 {
        self.shared.lock().retry_count
    }

    /// Whole-file digest, once computed
    pub fn digest(&self) -> Option<String> {
        match &*self.shared.digest.borrow() {
            DigestState::Ready(hex) => Some(hex.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ChunkUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkUploader")
            .field("file", &self.shared.source.name())
            .field("status", &self.status())
            .field("current_chunk", &self.current_chunk())
            .field("total_chunks", &self.total_chunks())
            .finish()
    }
}

/// Shorthand for [`ChunkUploader::start`]
pub fn upload(
    source: Arc<dyn ChunkSource>,
    options: UploadOptions,
    transport: Arc<dyn ChunkTransport>,
    digest: Arc<dyn ContentDigest>,
    callbacks: UploadCallbacks,
) -> Result<ChunkUploader, UploadChunkError> {
    ChunkUploader::start(source, options, transport, digest, callbacks)
}
