use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::configuration::MediaSettings;
use crate::error::MediaError;

/// An uploaded file parked on local disk until it is pushed to the media
/// host. The file is removed when the value is dropped, so a staged file
/// never outlives the request that produced it, whether the upload
/// succeeded, failed, or never happened.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file_name: String,
}

impl StagedFile {
    pub fn new(path: PathBuf, file_name: Option<String>) -> Self {
        let file_name = file_name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "upload".to_string());

        Self { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged file"
            ),
        }
    }
}

/// Remote host that turns a local file into a public URL
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file: &StagedFile) -> Result<String, MediaError>;
}

/// Upload `file` and consume it; the staged copy is gone once this returns.
pub async fn publish(host: &dyn MediaHost, file: StagedFile) -> Result<String, MediaError> {
    let result = host.upload(&file).await;
    drop(file);

    match result {
        Ok(url) if url.trim().is_empty() => Err(MediaError::EmptyUrl),
        other => other,
    }
}

/// Cloudinary-style upload API client
#[derive(Clone)]
pub struct CloudinaryClient {
    http_client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

impl CloudinaryClient {
    pub fn new(settings: &MediaSettings) -> Result<Self, MediaError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            cloud_name: settings.cloud_name.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/auto/upload", self.base_url, self.cloud_name)
    }
}

/// SHA-256 over the signed parameters followed by the API secret
fn sign_params(timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("timestamp={}{}", timestamp, api_secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload(&self, file: &StagedFile) -> Result<String, MediaError> {
        let bytes = tokio::fs::read(file.path())
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        let timestamp = chrono::Utc::now().timestamp();
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file.file_name().to_string()),
            )
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", sign_params(timestamp, &self.api_secret));

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach media host: {}", e);
                MediaError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), "Media host rejected upload");
            return Err(MediaError::Rejected(status.as_u16()));
        }

        let body: UploadResponse = response
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Media host returned error: {}", e);
                MediaError::Transport(e.to_string())
            })?
            .json()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let url = body.secure_url.or(body.url).unwrap_or_default();
        tracing::info!(file = %file.file_name(), "File uploaded to media host");
        Ok(url)
    }
}
