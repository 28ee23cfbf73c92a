//! Per-chunk request/response exchange

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_RANGE};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::error::{UploadError, UploadResult};
use super::types::CHUNK_CONTENT_TYPE;

/// One chunk ready to be sent
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    /// 0-based
    pub index: u64,
    pub file_name: String,
    /// `bytes {start}-{end}/{total}`
    pub content_range: String,
    pub data: Vec<u8>,
}

/// Server reply naming where the next chunk goes
#[derive(Debug, Clone)]
pub struct ChunkResponse {
    pub next_endpoint: String,
    pub raw: serde_json::Value,
}

impl ChunkResponse {
    /// Pull `data.url` out of a JSON body
    pub fn from_json(raw: serde_json::Value) -> UploadResult<Self> {
        #[derive(Deserialize)]
        struct Envelope {
            data: Continuation,
        }
        #[derive(Deserialize)]
        struct Continuation {
            url: String,
        }

        let envelope: Envelope = serde_json::from_value(raw.clone())
            .map_err(|e| UploadError::InvalidResponse(format!("missing data.url: {}", e)))?;
        Ok(Self {
            next_endpoint: envelope.data.url,
            raw,
        })
    }
}

#[async_trait]
pub trait ChunkTransport: Send + Sync {
    async fn put_chunk(&self, endpoint: &str, chunk: ChunkRequest) -> UploadResult<ChunkResponse>;
}

/// reqwest-backed transport sending each chunk as a multipart PUT
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> UploadResult<Self> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> UploadResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChunkTransport for HttpTransport {
    async fn put_chunk(&self, endpoint: &str, chunk: ChunkRequest) -> UploadResult<ChunkResponse> {
        debug!(
            "put_chunk: #{} {} -> {}",
            chunk.index + 1,
            chunk.content_range,
            endpoint
        );

        let file_part = Part::bytes(chunk.data)
            .file_name(chunk.file_name.clone())
            .mime_str(CHUNK_CONTENT_TYPE)?;
        let form = Form::new()
            .text("filename", chunk.file_name)
            .part("file", file_part);

        let response = self
            .client
            .put(endpoint)
            .header(ACCEPT, "*/*")
            .header(CONTENT_RANGE, chunk.content_range)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        let body = response.bytes().await?;
        let raw: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| UploadError::InvalidResponse(format!("body is not JSON: {}", e)))?;
        ChunkResponse::from_json(raw)
    }
}
