//! Media storage abstraction for uploaded files.
//!
//! Uploads either land on the local filesystem or are forwarded to an
//! external media host over HTTP. The remote host probes the media and
//! reports the playback duration for video files.

use std::path::PathBuf;

use serde::Deserialize;

use crate::{config::MediaConfig, AppError, AppResult};

/// Uploaded media metadata.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    /// Storage key (path or object key).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// Playback duration in seconds, when the backend can determine it.
    pub duration: Option<f64>,
}

/// Media storage backend trait.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload a file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
        -> AppResult<UploadedMedia>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Build the configured storage backend.
#[must_use]
pub fn from_config(config: &MediaConfig) -> std::sync::Arc<dyn MediaStorage> {
    match config {
        MediaConfig::Local {
            base_path,
            base_url,
        } => std::sync::Arc::new(LocalStorage::new(
            PathBuf::from(base_path),
            base_url.clone(),
        )),
        MediaConfig::Remote {
            upload_url,
            api_key,
        } => std::sync::Arc::new(RemoteStorage::new(upload_url.clone(), api_key.clone())),
    }
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl MediaStorage for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedMedia> {
        let path = self.base_path.join(key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        Ok(UploadedMedia {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            duration: None,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// External media host backend.
///
/// Forwards the upload as multipart form data and reads back the hosted
/// URL plus the probed duration. Nothing is kept locally either way.
pub struct RemoteStorage {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
}

/// Upload response returned by the media host.
#[derive(Debug, Deserialize)]
struct RemoteUploadResponse {
    url: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    bytes: Option<u64>,
}

impl RemoteStorage {
    /// Create a new remote storage backend.
    #[must_use]
    pub fn new(upload_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl MediaStorage for RemoteStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedMedia> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(key.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid content type: {e}")))?;

        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Media upload failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Media host returned {}",
                response.status()
            )));
        }

        let size = data.len() as u64;
        let body: RemoteUploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid media host response: {e}")))?;

        Ok(UploadedMedia {
            key: key.to_string(),
            url: body.url,
            size: body.bytes.unwrap_or(size),
            content_type: content_type.to_string(),
            duration: body.duration,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let response = self
            .client
            .delete(format!(
                "{}/{key}",
                self.upload_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Media delete failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Media host returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.upload_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("playtube-storage-{}", std::process::id()));
        let storage = LocalStorage::new(dir.clone(), "/media".to_string());

        let uploaded = storage
            .upload("thumbnails/t1.png", b"png-bytes", "image/png")
            .await
            .unwrap();

        assert_eq!(uploaded.url, "/media/thumbnails/t1.png");
        assert_eq!(uploaded.size, 9);
        assert!(uploaded.duration.is_none());
        assert!(dir.join("thumbnails/t1.png").exists());

        storage.delete("thumbnails/t1.png").await.unwrap();
        assert!(!dir.join("thumbnails/t1.png").exists());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[test]
    fn test_public_url_trims_trailing_slash() {
        let storage = LocalStorage::new(PathBuf::from("/tmp"), "/media/".to_string());
        assert_eq!(storage.public_url("a.png"), "/media/a.png");
    }
}
