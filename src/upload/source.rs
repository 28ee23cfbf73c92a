//! Byte sources for chunked uploads

use async_trait::async_trait;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

use super::error::{UploadError, UploadResult};

/// Immutable, randomly readable upload source
#[async_trait]
pub trait ChunkSource: Send + Sync {
    fn name(&self) -> &str;

    fn size(&self) -> u64;

    /// Load `[from, to)` into memory
    async fn read_range(&self, range: Range<u64>) -> UploadResult<Vec<u8>>;
}

/// A file on local disk, opened afresh for each read
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    size: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> UploadResult<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(UploadError::Validation(format!(
                "not a file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            path,
            name,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ChunkSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_range(&self, range: Range<u64>) -> UploadResult<Vec<u8>> {
        let end = range.end.min(self.size);
        let start = range.start.min(end);

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(start)).await?;

        let mut buffer = vec![0u8; (end - start) as usize];
        file.read_exact(&mut buffer).await?;
        Ok(buffer)
    }
}

/// In-memory source, handy for generated payloads
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

#[async_trait]
impl ChunkSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_range(&self, range: Range<u64>) -> UploadResult<Vec<u8>> {
        let len = self.data.len();
        let end = (range.end as usize).min(len);
        let start = (range.start as usize).min(end);
        Ok(self.data[start..end].to_vec())
    }
}
