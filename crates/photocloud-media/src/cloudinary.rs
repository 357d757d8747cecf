use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::{MediaError, MediaStore, UploadedAsset};

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";
pub const DEFAULT_FOLDER: &str = "photo_app";

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Logical folder every upload lands in.
    pub folder: String,
    pub api_base: String,
}

/// Signed-upload client for Cloudinary's image endpoints.
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResult {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, data: Bytes, file_name: Option<String>) -> Result<UploadedAsset, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.config.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let size = data.len();
        let part = Part::stream(data).file_name(file_name.unwrap_or_else(|| "upload".into()));
        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature", signature)
            .part("file", part);

        debug!("Relaying {} bytes to media service folder {}", size, self.config.folder);
        let resp = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let result: UploadResult = read_json(resp).await?;
        info!("Media service stored {} ({} bytes)", result.public_id, size);

        Ok(UploadedAsset {
            url: result.secure_url,
            public_id: result.public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let resp = self
            .http
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("api_key", self.config.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        let result: DestroyResult = read_json(resp).await?;
        match result.result.as_str() {
            "ok" => info!("Media service removed {}", public_id),
            "not found" => warn!("Media service had no asset {}", public_id),
            other => {
                return Err(MediaError::InvalidResponse(format!(
                    "destroy of {} returned '{}'",
                    public_id, other
                )));
            }
        }
        Ok(())
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as
/// `k=v&k=v`, with the API secret appended, then SHA-1 hex encoded.
/// Empty values are left out.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by_key(|(k, _)| *k);

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, MediaError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(MediaError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    resp.json::<T>()
        .await
        .map_err(|e| MediaError::InvalidResponse(e.to_string()))
}
