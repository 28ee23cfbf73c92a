//! Mutable upload session state and its transitions
//!
//! All transitions are plain synchronous methods. The worker calls them
//! while holding the session lock and releases the lock before any await
//! or callback.

use super::chunk::ChunkPlan;
use super::transport::ChunkResponse;
use super::types::{ErrorCode, UploadChunkError, UploadStatus};

#[derive(Debug)]
pub(crate) struct SessionState {
    pub endpoint: String,
    pub plan: ChunkPlan,
    pub current_chunk: u64,
    pub retry_count: u32,
    pub max_retries: u32,
    pub paused: bool,
    pub completed: bool,
    pub aborted: bool,
    pub last_response: Option<serde_json::Value>,
    /// A drive task currently owns the loop
    pub running: bool,
}

/// What the drive loop should do next
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Send {
        index: u64,
        endpoint: String,
    },
    Finish {
        endpoint: String,
        response: serde_json::Value,
    },
    Stop,
}

/// How a failed attempt was classified
#[derive(Debug, PartialEq)]
pub(crate) enum FailureAction {
    Retry(UploadChunkError),
    Pause(UploadChunkError),
    Ignore,
}

impl SessionState {
    pub fn new(endpoint: String, plan: ChunkPlan, max_retries: u32) -> Self {
        Self {
            endpoint,
            plan,
            current_chunk: 0,
            retry_count: 0,
            max_retries,
            paused: false,
            completed: false,
            aborted: false,
            last_response: None,
            running: true,
        }
    }

    pub fn status(&self) -> UploadStatus {
        if self.aborted {
            UploadStatus::Aborted
        } else if self.completed {
            UploadStatus::Completed
        } else if self.paused {
            UploadStatus::Paused
        } else {
            UploadStatus::Uploading
        }
    }

    fn halted(&self) -> bool {
        self.paused || self.completed || self.aborted
    }

    /// Iteration boundary: decide the next step and claim the attempt
    pub fn next_step(&mut self) -> Step {
        if self.halted() {
            self.running = false;
            return Step::Stop;
        }
        if self.current_chunk >= self.plan.total_chunks() {
            self.completed = true;
            self.running = false;
            return Step::Finish {
                endpoint: self.endpoint.clone(),
                response: self.last_response.take().unwrap_or_default(),
            };
        }
        self.retry_count += 1;
        Step::Send {
            index: self.current_chunk,
            endpoint: self.endpoint.clone(),
        }
    }

    /// Apply a verified response; returns the progress percent to report
    pub fn chunk_succeeded(&mut self, response: ChunkResponse) -> f64 {
        self.endpoint = response.next_endpoint;
        self.last_response = Some(response.raw);
        self.retry_count = 0;
        self.current_chunk += 1;
        self.plan.percent(self.current_chunk)
    }

    pub fn chunk_failed(&mut self, message: String) -> FailureAction {
        if self.halted() {
            self.running = false;
            return FailureAction::Ignore;
        }
        let attempt_left = self.max_retries.saturating_sub(self.retry_count);
        if self.retry_count < self.max_retries {
            return FailureAction::Retry(UploadChunkError::chunk(
                ErrorCode::UploadChunkFailed,
                message,
                attempt_left,
                self.current_chunk,
            ));
        }
        self.paused = true;
        self.running = false;
        FailureAction::Pause(UploadChunkError::chunk(
            ErrorCode::UploadChunkAllRetriesFailed,
            message,
            attempt_left,
            self.current_chunk,
        ))
    }

    pub fn pause(&mut self) -> bool {
        if self.completed || self.aborted || self.paused {
            return false;
        }
        self.paused = true;
        true
    }

    /// Returns true if a new drive task must be spawned
    pub fn resume(&mut self) -> bool {
        if !self.paused || self.completed || self.aborted {
            return false;
        }
        self.paused = false;
        if self.retry_count >= self.max_retries {
            self.retry_count = 0;
        }
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    pub fn abort(&mut self) -> bool {
        if self.completed || self.aborted {
            return false;
        }
        self.aborted = true;
        self.paused = false;
        true
    }
}
