//! Upload event payloads, error codes and status definitions

use serde::{Deserialize, Serialize};

/// Retry budget used when the caller does not set one
pub const DEFAULT_RETRIES: u32 = 5;

/// Chunk sizes must be a multiple of this many kilobytes
pub const CHUNK_SIZE_UNIT_KB: u64 = 256;

/// Bytes per kilobyte for chunk sizing
pub const BYTES_PER_KB: u64 = 1024;

/// Content type attached to every chunk body
pub const CHUNK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    #[serde(rename = "UPLOAD_CHUNK_FAILED")]
    UploadChunkFailed,
    #[serde(rename = "UPLOAD_CHUNK_ALL_RETRIES_FAILED")]
    UploadChunkAllRetriesFailed,
    #[serde(rename = "VALIDATION_FAILED")]
    ValidationFailed,
    #[serde(rename = "FAILED_HASH_MD5")]
    FailedHashMd5,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::UploadChunkFailed => write!(f, "UPLOAD_CHUNK_FAILED"),
            ErrorCode::UploadChunkAllRetriesFailed => write!(f, "UPLOAD_CHUNK_ALL_RETRIES_FAILED"),
            ErrorCode::ValidationFailed => write!(f, "VALIDATION_FAILED"),
            ErrorCode::FailedHashMd5 => write!(f, "FAILED_HASH_MD5"),
        }
    }
}

/// Error payload delivered to the error callback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadChunkError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_left: Option<u32>,
    /// 1-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_number: Option<u64>,
}

impl UploadChunkError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            attempt_left: None,
            chunk_number: None,
        }
    }

    pub fn hash(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::FailedHashMd5,
            message: message.into(),
            attempt_left: None,
            chunk_number: None,
        }
    }

    pub(crate) fn chunk(
        code: ErrorCode,
        message: impl Into<String>,
        attempt_left: u32,
        chunk_index: u64,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            attempt_left: Some(attempt_left),
            chunk_number: Some(chunk_index + 1),
        }
    }
}

impl std::fmt::Display for UploadChunkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(chunk) = self.chunk_number {
            write!(f, " (chunk {}", chunk)?;
            if let Some(left) = self.attempt_left {
                write!(f, ", {} attempts left", left)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for UploadChunkError {}

/// Success payload delivered once every chunk has been accepted
#[derive(Debug, Clone, Serialize)]
pub struct UploadSuccess {
    /// Continuation endpoint returned with the final chunk
    pub endpoint: String,
    /// Hex digest of the whole file, empty if hashing failed
    pub digest: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadStatus {
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "aborted")]
    Aborted,
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Paused => write!(f, "paused"),
            UploadStatus::Completed => write!(f, "completed"),
            UploadStatus::Aborted => write!(f, "aborted"),
        }
    }
}

pub type ProgressFn = Box<dyn Fn(f64) + Send + Sync>;
pub type SuccessFn = Box<dyn Fn(UploadSuccess) + Send + Sync>;
pub type ErrorFn = Box<dyn Fn(UploadChunkError) + Send + Sync>;

/// The three caller-facing callback channels
pub struct UploadCallbacks {
    pub on_progress: ProgressFn,
    pub on_success: SuccessFn,
    pub on_error: ErrorFn,
}

impl UploadCallbacks {
    pub fn new(
        on_progress: impl Fn(f64) + Send + Sync + 'static,
        on_success: impl Fn(UploadSuccess) + Send + Sync + 'static,
        on_error: impl Fn(UploadChunkError) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_progress: Box::new(on_progress),
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        }
    }
}

impl std::fmt::Debug for UploadCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCallbacks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, UploadChunkError, UploadStatus};

    #[test]
    fn error_codes_serialize_to_wire_names() {
        let codes = [
            (ErrorCode::UploadChunkFailed, "\"UPLOAD_CHUNK_FAILED\""),
            (
                ErrorCode::UploadChunkAllRetriesFailed,
                "\"UPLOAD_CHUNK_ALL_RETRIES_FAILED\"",
            ),
            (ErrorCode::ValidationFailed, "\"VALIDATION_FAILED\""),
            (ErrorCode::FailedHashMd5, "\"FAILED_HASH_MD5\""),
        ];
        for (code, expected) in codes {
            assert_eq!(serde_json::to_string(&code).unwrap(), expected);
            assert_eq!(format!("\"{}\"", code), expected);
        }
    }

    #[test]
    fn chunk_error_payload_uses_camel_case_and_one_based_chunk() {
        let err = UploadChunkError::chunk(ErrorCode::UploadChunkFailed, "boom", 3, 0);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "UPLOAD_CHUNK_FAILED");
        assert_eq!(json["attemptLeft"], 3);
        assert_eq!(json["chunkNumber"], 1);
    }

    #[test]
    fn validation_error_omits_chunk_fields() {
        let json = serde_json::to_value(UploadChunkError::validation("bad size")).unwrap();
        assert!(json.get("attemptLeft").is_none());
        assert!(json.get("chunkNumber").is_none());
    }

    #[test]
    fn upload_status_display_matches_expected_strings() {
        assert_eq!(UploadStatus::Uploading.to_string(), "uploading");
        assert_eq!(UploadStatus::Paused.to_string(), "paused");
        assert_eq!(UploadStatus::Completed.to_string(), "completed");
        assert_eq!(UploadStatus::Aborted.to_string(), "aborted");
    }
}
