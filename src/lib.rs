//! Sequential chunked file upload.
//!
//! A [`ChunkUploader`] splits a file into fixed-size chunks and PUTs them
//! one after another, retrying each chunk up to a budget and following the
//! continuation endpoint each response names. Hashing, byte-range reads and
//! the HTTP exchange sit behind the [`ContentDigest`], [`ChunkSource`] and
//! [`ChunkTransport`] traits.

pub mod upload;

pub use upload::{
    upload, ChunkSource, ChunkTransport, ChunkUploader, ContentDigest, ErrorCode, FileSource,
    HttpTransport, Md5Digest, MemorySource, UploadCallbacks, UploadChunkError, UploadOptions,
    UploadStatus, UploadSuccess,
};
