//! Image upload collaborator
//!
//! Turns a binary image into a hosted URL. Two implementations are provided:
//!
//! - **Cloudinary**: unsigned multipart upload using an upload preset
//! - **Inline**: fallback used when no Cloudinary credentials are configured;
//!   returns a `data:` URL so the avatar flow keeps working in development
//!
//! Only the avatar path of a profile update uses this collaborator.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Cloud name shipped in sample configuration; treated as "not configured"
pub const PLACEHOLDER_CLOUD_NAME: &str = "your_cloud_name";

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Uploads an image and returns its hosted URL
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String>;
}

fn ensure_within_limit(len: usize, max_bytes: usize) -> Result<()> {
    if len > max_bytes {
        return Err(AppError::Upload(format!(
            "File is {} bytes, the limit is {} bytes",
            len, max_bytes
        )));
    }
    Ok(())
}

fn mime_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

// ============= Cloudinary =============

#[derive(Debug, Deserialize)]
struct CloudinaryResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: Option<CloudinaryErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: Option<String>,
}

pub struct CloudinaryUploader {
    http: reqwest::Client,
    endpoint: String,
    upload_preset: String,
    max_bytes: usize,
}

impl CloudinaryUploader {
    pub fn new(
        cloud_name: impl AsRef<str>,
        upload_preset: impl Into<String>,
        max_bytes: usize,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/{}/image/upload", CLOUDINARY_API_BASE, cloud_name.as_ref()),
            upload_preset: upload_preset.into(),
            max_bytes,
        }
    }

    /// Point the uploader at a different endpoint (mock servers, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        ensure_within_limit(bytes.len(), self.max_bytes)?;

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(&mime_for(file_name))
            .map_err(|e| AppError::Upload(format!("Invalid file type: {}", e)))?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        debug!("Uploading {} to Cloudinary", file_name);
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Cloudinary upload error: {}", e);
                AppError::Upload(format!("Failed to upload image: {}", e))
            })?;

        if !response.status().is_success() {
            let message = response
                .json::<CloudinaryErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| "Failed to upload image to Cloudinary".to_string());
            error!("Cloudinary upload rejected: {}", message);
            return Err(AppError::Upload(message));
        }

        let body: CloudinaryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Invalid upload response: {}", e)))?;
        Ok(body.secure_url)
    }
}

// ============= Inline fallback =============

/// Encodes the image as a `data:` URL instead of hosting it
pub struct InlineUploader {
    max_bytes: usize,
}

impl InlineUploader {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl ImageUploader for InlineUploader {
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        ensure_within_limit(bytes.len(), self.max_bytes)?;
        Ok(format!(
            "data:{};base64,{}",
            mime_for(file_name),
            BASE64.encode(bytes)
        ))
    }
}

/// Pick the uploader for the given credentials.
///
/// Missing credentials, or the sample placeholder cloud name, select the
/// inline fallback.
pub fn select_uploader(
    cloud_name: Option<String>,
    upload_preset: Option<String>,
    max_bytes: usize,
) -> Arc<dyn ImageUploader> {
    match (cloud_name, upload_preset) {
        (Some(cloud), Some(preset))
            if !cloud.is_empty() && !preset.is_empty() && cloud != PLACEHOLDER_CLOUD_NAME =>
        {
            Arc::new(CloudinaryUploader::new(cloud, preset, max_bytes))
        }
        _ => {
            warn!("Cloudinary credentials not configured. Using inline data URLs for uploads.");
            Arc::new(InlineUploader::new(max_bytes))
        }
    }
}
