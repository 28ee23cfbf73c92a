use serde::{Deserialize, Serialize};

use super::error::{UploadError, UploadResult};
use super::types::{BYTES_PER_KB, CHUNK_SIZE_UNIT_KB, DEFAULT_RETRIES};

/// Caller-supplied upload settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadOptions {
    pub endpoint: String,
    /// Size per chunk in kilobytes, must be a multiple of 256
    pub chunk_size_kb: u64,
    #[serde(default)]
    pub retries: Option<u32>,
}

impl UploadOptions {
    pub fn new(endpoint: impl Into<String>, chunk_size_kb: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            chunk_size_kb,
            retries: None,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn from_json(json: &str) -> UploadResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| UploadError::Validation(format!("invalid upload options: {}", e)))
    }

    pub(crate) fn validate(&self) -> UploadResult<ValidatedOptions> {
        if self.endpoint.trim().is_empty() {
            return Err(UploadError::Validation("endpoint must not be empty".into()));
        }
        if self.chunk_size_kb == 0 || self.chunk_size_kb % CHUNK_SIZE_UNIT_KB != 0 {
            return Err(UploadError::Validation(format!(
                "chunk size must be a positive multiple of {} KB, got {} KB",
                CHUNK_SIZE_UNIT_KB, self.chunk_size_kb
            )));
        }
        let max_retries = self.retries.unwrap_or(DEFAULT_RETRIES);
        if max_retries == 0 {
            return Err(UploadError::Validation(
                "retries must be at least 1".into(),
            ));
        }
        let chunk_size = self
            .chunk_size_kb
            .checked_mul(BYTES_PER_KB)
            .ok_or_else(|| UploadError::Validation("chunk size overflows".into()))?;

        Ok(ValidatedOptions {
            endpoint: self.endpoint.clone(),
            chunk_size,
            max_retries,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedOptions {
    pub endpoint: String,
    pub chunk_size: u64,
    pub max_retries: u32,
}

#[cfg(test)]
mod tests {
    use super::UploadOptions;

    #[test]
    fn chunk_size_is_converted_to_bytes() {
        let checked = UploadOptions::new("https://up.example/a", 512).validate().unwrap();
        assert_eq!(checked.chunk_size, 512 * 1024);
        assert_eq!(checked.max_retries, 5);
    }

    #[test]
    fn chunk_size_must_be_multiple_of_256() {
        assert!(UploadOptions::new("https://up.example/a", 100).validate().is_err());
        assert!(UploadOptions::new("https://up.example/a", 0).validate().is_err());
        assert!(UploadOptions::new("https://up.example/a", 768).validate().is_ok());
    }

    #[test]
    fn zero_retries_and_blank_endpoint_are_rejected() {
        let zero = UploadOptions::new("https://up.example/a", 256).with_retries(0);
        assert!(zero.validate().is_err());
        assert!(UploadOptions::new("  ", 256).validate().is_err());
    }

    #[test]
    fn options_parse_from_json_with_default_retries() {
        let opts =
            UploadOptions::from_json(r#"{"endpoint":"https://up.example/a","chunkSizeKb":256}"#)
                .unwrap();
        assert_eq!(opts.retries, None);
        assert_eq!(opts.validate().unwrap().max_retries, 5);

        let opts = UploadOptions::from_json(
            r#"{"endpoint":"https://up.example/a","chunkSizeKb":256,"retries":2}"#,
        )
        .unwrap();
        assert_eq!(opts.validate().unwrap().max_retries, 2);
    }
}
