use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use photocloud_api::DEFAULT_MAX_UPLOAD_BYTES;
use photocloud_media::CloudinaryConfig;
use photocloud_media::cloudinary::{DEFAULT_API_BASE, DEFAULT_FOLDER};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

/// Everything the server reads from its environment, resolved once at startup.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub max_upload_bytes: usize,
    pub web_dir: PathBuf,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };

        let jwt_secret = lookup("PHOTOCLOUD_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PHOTOCLOUD_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = var("PHOTOCLOUD_PORT", "5000")
            .parse()
            .context("PHOTOCLOUD_PORT must be a port number")?;

        let max_upload_bytes = match lookup("PHOTOCLOUD_MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse()
                .context("PHOTOCLOUD_MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            folder: var("CLOUDINARY_FOLDER", DEFAULT_FOLDER),
            api_base: var("CLOUDINARY_API_BASE", DEFAULT_API_BASE),
        };

        Ok(Self {
            host: var("PHOTOCLOUD_HOST", "0.0.0.0"),
            port,
            db_path: var("PHOTOCLOUD_DB_PATH", "photocloud.db").into(),
            jwt_secret,
            max_upload_bytes,
            web_dir: var("PHOTOCLOUD_WEB_DIR", "./web").into(),
            cloudinary,
        })
    }
}
