//! Upload worker - sequential chunk drive loop and the whole-file digest task

use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use super::chunk::ChunkPlan;
use super::digest::{ContentDigest, DIGEST_BLOCK_SIZE};
use super::error::{UploadError, UploadResult};
use super::session::{FailureAction, SessionState, Step};
use super::source::ChunkSource;
use super::transport::{ChunkRequest, ChunkResponse, ChunkTransport};
use super::types::{UploadCallbacks, UploadChunkError, UploadSuccess};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DigestState {
    Pending,
    Ready(String),
    Failed,
}

/// Everything one upload session shares between its tasks and its handle
pub(crate) struct Shared {
    pub plan: ChunkPlan,
    pub source: Arc<dyn ChunkSource>,
    pub transport: Arc<dyn ChunkTransport>,
    pub callbacks: UploadCallbacks,
    pub digest: watch::Receiver<DigestState>,
    state: Mutex<SessionState>,
}

impl Shared {
    pub fn new(
        state: SessionState,
        source: Arc<dyn ChunkSource>,
        transport: Arc<dyn ChunkTransport>,
        callbacks: UploadCallbacks,
        digest: watch::Receiver<DigestState>,
    ) -> Self {
        Self {
            plan: state.plan,
            source,
            transport,
            callbacks,
            digest,
            state: Mutex::new(state),
        }
    }

    /// Never hold the guard across an await or a callback
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn report_error(&self, err: UploadChunkError) {
        (self.callbacks.on_error)(err);
    }
}

/// Stream the whole source once, block by block, and publish its digest
pub(crate) async fn run_digest(
    shared: Arc<Shared>,
    digest: Arc<dyn ContentDigest>,
    tx: watch::Sender<DigestState>,
) {
    match compute_digest(shared.source.as_ref(), digest).await {
        Ok(hex) => {
            info!("upload_digest: {} -> {}", shared.source.name(), hex);
            let _ = tx.send(DigestState::Ready(hex));
        }
        Err(err) => {
            warn!("upload_digest: {} failed: {}", shared.source.name(), err);
            shared.report_error(UploadChunkError::hash(err.to_string()));
            let _ = tx.send(DigestState::Failed);
        }
    }
}

async fn compute_digest(
    source: &dyn ChunkSource,
    digest: Arc<dyn ContentDigest>,
) -> UploadResult<String> {
    let size = source.size();
    let mut digester = digest.digester();
    let mut offset = 0;
    while offset < size {
        let end = offset.saturating_add(DIGEST_BLOCK_SIZE).min(size);
        let block = source.read_range(offset..end).await?;
        if block.len() as u64 != end - offset {
            return Err(UploadError::Digest(format!(
                "short read at {}: {} of {} bytes",
                offset,
                block.len(),
                end - offset
            )));
        }
        digester = hash_off_runtime(move || {
            let mut digester = digester;
            digester.update(&block).map(|()| digester)
        })
        .await?;
        offset = end;
    }
    hash_off_runtime(move || digester.finalize()).await
}

/// Hashing is CPU-bound; keep it off the async workers driving chunks
async fn hash_off_runtime<T, F>(work: F) -> UploadResult<T>
where
    F: FnOnce() -> UploadResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| UploadError::Digest(format!("hashing task failed: {}", e)))?
}

async fn send_chunk(shared: &Shared, index: u64, endpoint: &str) -> UploadResult<ChunkResponse> {
    let range = shared.plan.range(index);
    let data = shared.source.read_range(range).await?;
    let request = ChunkRequest {
        index,
        file_name: shared.source.name().to_string(),
        content_range: shared.plan.content_range(index, data.len() as u64),
        data,
    };
    shared.transport.put_chunk(endpoint, request).await
}

/// Drive chunks in order until the session completes, pauses or aborts.
///
/// Exactly one drive task runs per session; `SessionState::running`
/// records ownership and is released by the same transition that stops it.
pub(crate) async fn drive(shared: Arc<Shared>) {
    loop {
        let step = shared.lock().next_step();
        let (index, endpoint) = match step {
            Step::Stop => {
                debug!("upload_drive: {} halted", shared.source.name());
                return;
            }
            Step::Finish { endpoint, response } => {
                finish(&shared, endpoint, response).await;
                return;
            }
            Step::Send { index, endpoint } => (index, endpoint),
        };

        debug!(
            "upload_chunk: {} #{}/{} -> {}",
            shared.source.name(),
            index + 1,
            shared.plan.total_chunks(),
            endpoint
        );

        match send_chunk(&shared, index, &endpoint).await {
            Ok(response) => {
                let percent = shared.lock().chunk_succeeded(response);
                (shared.callbacks.on_progress)(percent);
            }
            Err(err) => {
                let action = shared.lock().chunk_failed(err.to_string());
                match action {
                    FailureAction::Retry(payload) => {
                        warn!(
                            "upload_chunk: {} #{} failed, {} attempts left: {}",
                            shared.source.name(),
                            index + 1,
                            payload.attempt_left.unwrap_or(0),
                            err
                        );
                        shared.report_error(payload);
                    }
                    FailureAction::Pause(payload) => {
                        error!(
                            "upload_chunk: {} #{} exhausted retries, pausing: {}",
                            shared.source.name(),
                            index + 1,
                            err
                        );
                        shared.report_error(payload);
                        return;
                    }
                    FailureAction::Ignore => {
                        debug!(
                            "upload_chunk: {} #{} failed after halt: {}",
                            shared.source.name(),
                            index + 1,
                            err
                        );
                        return;
                    }
                }
            }
        }
    }
}

async fn finish(shared: &Shared, endpoint: String, response: serde_json::Value) {
    let mut digest_rx = shared.digest.clone();
    let digest = match digest_rx
        .wait_for(|state| *state != DigestState::Pending)
        .await
        .map(|state| state.clone())
    {
        Ok(DigestState::Ready(hex)) => hex,
        _ => String::new(),
    };

    info!(
        "upload_complete: {} ({} chunks) -> {}",
        shared.source.name(),
        shared.plan.total_chunks(),
        endpoint
    );
    (shared.callbacks.on_success)(UploadSuccess {
        endpoint,
        digest,
        response,
    });
}

#[cfg(test)]
mod tests {
    use super::compute_digest;
    use crate::upload::digest::{md5_hex, Md5Digest, DIGEST_BLOCK_SIZE};
    use crate::upload::error::UploadResult;
    use crate::upload::source::{ChunkSource, MemorySource};
    use async_trait::async_trait;
    use std::ops::Range;
    use std::sync::{Arc, Mutex};

    /// Records the length of every read it serves
    struct RecordingSource {
        inner: MemorySource,
        reads: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl ChunkSource for RecordingSource {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn size(&self) -> u64 {
            self.inner.size()
        }

        async fn read_range(&self, range: Range<u64>) -> UploadResult<Vec<u8>> {
            self.reads.lock().unwrap().push(range.end - range.start);
            self.inner.read_range(range).await
        }
    }

    #[tokio::test]
    async fn digest_reads_source_in_bounded_blocks() {
        let len = 5 * DIGEST_BLOCK_SIZE as usize + 123;
        let data: Vec<u8> = (0..len).map(|i| (i % 241) as u8).collect();
        let source = RecordingSource {
            inner: MemorySource::new("big.bin", data.clone()),
            reads: Mutex::new(Vec::new()),
        };

        let hex = compute_digest(&source, Arc::new(Md5Digest)).await.unwrap();
        assert_eq!(hex, md5_hex(&data));

        let reads = source.reads.lock().unwrap().clone();
        assert_eq!(reads.len(), 6);
        assert!(reads.iter().all(|&n| n <= DIGEST_BLOCK_SIZE));
        assert_eq!(reads.iter().sum::<u64>(), len as u64);
    }
}
