//! Whole-file content digest

use md5::{Digest, Md5};

use super::error::UploadResult;

/// Block size used when streaming the source through a digester
pub const DIGEST_BLOCK_SIZE: u64 = 1024 * 1024;

/// Opaque digest function over the complete file contents.
///
/// Each session asks for one fresh [`Digester`] and feeds it the file in
/// order, one bounded block at a time.
pub trait ContentDigest: Send + Sync {
    fn digester(&self) -> Box<dyn Digester>;
}

/// Incremental hashing state for one file
pub trait Digester: Send {
    fn update(&mut self, data: &[u8]) -> UploadResult<()>;

    /// Lowercase hex digest of everything passed to `update`
    fn finalize(self: Box<Self>) -> UploadResult<String>;
}

/// Lowercase hex MD5
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Digest;

impl ContentDigest for Md5Digest {
    fn digester(&self) -> Box<dyn Digester> {
        Box::new(Md5Digester(Md5::new()))
    }
}

struct Md5Digester(Md5);

impl Digester for Md5Digester {
    fn update(&mut self, data: &[u8]) -> UploadResult<()> {
        self.0.update(data);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> UploadResult<String> {
        Ok(hex::encode(self.0.finalize()))
    }
}

pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{md5_hex, ContentDigest, Md5Digest};

    fn digest_in_blocks(data: &[u8], block: usize) -> String {
        let mut digester = Md5Digest.digester();
        for piece in data.chunks(block) {
            digester.update(piece).unwrap();
        }
        digester.finalize().unwrap()
    }

    #[test]
    fn md5_matches_known_vectors() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            digest_in_blocks(b"The quick brown fox jumps over the lazy dog", 64),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
        assert_eq!(
            Md5Digest.digester().finalize().unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn block_size_does_not_change_digest() {
        let data: Vec<u8> = (0..100_003u32).map(|i| (i % 253) as u8).collect();
        let whole = md5_hex(&data);
        for block in [1, 7, 4096, 65_536, 1 << 20] {
            assert_eq!(digest_in_blocks(&data, block), whole, "block size {}", block);
        }
    }
}
