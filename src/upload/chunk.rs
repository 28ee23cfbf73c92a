//! Chunk slicing arithmetic

use std::ops::Range;

/// Fixed chunk layout of one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
    total_chunks: u64,
}

impl ChunkPlan {
    pub fn new(file_size: u64, chunk_size: u64) -> Self {
        let total_chunks = if chunk_size == 0 {
            0
        } else {
            file_size.div_ceil(chunk_size)
        };
        Self {
            file_size,
            chunk_size,
            total_chunks,
        }
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// Byte range `[from, to)` of chunk `index`, clamped to the file length
    pub fn range(&self, index: u64) -> Range<u64> {
        if self.total_chunks == 1 {
            return 0..self.file_size;
        }
        let from = index.saturating_mul(self.chunk_size).min(self.file_size);
        let to = from.saturating_add(self.chunk_size).min(self.file_size);
        from..to
    }

    /// `Content-Range` value for a chunk of `len` bytes at `index`
    pub fn content_range(&self, index: u64, len: u64) -> String {
        let start = if self.total_chunks == 1 {
            0
        } else {
            index * self.chunk_size
        };
        let end = (start + len).saturating_sub(1);
        format!("bytes {}-{}/{}", start, end, self.file_size)
    }

    /// Percent of chunks fully sent once `completed` chunks are done
    pub fn percent(&self, completed: u64) -> f64 {
        if self.total_chunks == 0 {
            return 100.0;
        }
        100.0 * (completed as f64 / self.total_chunks as f64)
    }
}
