//! Relay between the photo API and the external media service that actually
//! stores, encodes and serves image bytes.

pub mod cloudinary;

use async_trait::async_trait;
use bytes::Bytes;

pub use cloudinary::{CloudinaryConfig, CloudinaryStore};

/// Where the media service put an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// HTTPS delivery URL.
    pub url: String,
    /// Asset id used to address the image for later deletion.
    pub public_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("unexpected media service response: {0}")]
    InvalidResponse(String),
}

/// Remote image storage. One call per operation; no retries.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, data: Bytes, file_name: Option<String>) -> Result<UploadedAsset, MediaError>;

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError>;
}
