//! Chunked upload module with sequential transmission, retry and pause/resume
//!
//! Provides a single-file upload state machine with:
//! - Fixed-size chunk slicing with `Content-Range` headers
//! - Multipart PUT per chunk, following the server's continuation endpoint
//! - Retry budget per chunk, pausing once it is spent
//! - Whole-file MD5 digest computed alongside the upload
//! - Progress/success/error callbacks

mod chunk;
mod config;
mod digest;
mod error;
mod session;
mod source;
mod transport;
mod types;
mod uploader;
mod worker;

pub use chunk::ChunkPlan;
pub use config::UploadOptions;
pub use digest::{md5_hex, ContentDigest, Digester, Md5Digest, DIGEST_BLOCK_SIZE};
pub use error::{UploadError, UploadResult};
pub use source::{ChunkSource, FileSource, MemorySource};
pub use transport::{ChunkRequest, ChunkResponse, ChunkTransport, HttpTransport};
pub use types::{
    ErrorCode, ErrorFn, ProgressFn, SuccessFn, UploadCallbacks, UploadChunkError, UploadStatus,
    UploadSuccess, BYTES_PER_KB, CHUNK_CONTENT_TYPE, CHUNK_SIZE_UNIT_KB, DEFAULT_RETRIES,
};
pub use uploader::{upload, ChunkUploader};
