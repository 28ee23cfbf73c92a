//! Internal error type for upload collaborators

pub type UploadResult<T> = Result<T, UploadError>;

/// Failures raised while reading, hashing or transmitting a chunk.
///
/// The `Display` text becomes the `message` of the caller-facing
/// [`UploadChunkError`](super::UploadChunkError) payload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload failed: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("invalid continuation response: {0}")]
    InvalidResponse(String),

    #[error("digest failed: {0}")]
    Digest(String),

    #[error("validation failed: {0}")]
    Validation(String),
}
