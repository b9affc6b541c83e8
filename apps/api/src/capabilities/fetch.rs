//! File fetch capability — materializes a CV document to the local download
//! directory. Idempotent: an already-materialized file is never re-fetched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::dispatch::Capability;
use crate::errors::AppError;

pub const TASK_DOWNLOAD_FILE: &str = "download_file";

pub struct FileFetchCapability {
    http: reqwest::Client,
    download_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    url: String,
    filename: Option<String>,
}

impl FileFetchCapability {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            download_dir: download_dir.into(),
        }
    }
}

#[async_trait]
impl Capability for FileFetchCapability {
    fn name(&self) -> &str {
        "file_fetch"
    }

    fn can_handle(&self, task: &str) -> bool {
        task == TASK_DOWNLOAD_FILE
    }

    async fn perform(&self, _task: &str, payload: Value) -> Result<Value, AppError> {
        let request: DownloadRequest = serde_json::from_value(payload)
            .map_err(|_| AppError::MissingInput("Missing 'url'".to_string()))?;

        let filename = request
            .filename
            .as_deref()
            .unwrap_or_else(|| request.url.rsplit('/').next().unwrap_or("document.pdf"));
        // Strip any directory components a hostile locator might smuggle in.
        let filename = Path::new(filename)
            .file_name()
            .ok_or_else(|| AppError::MissingInput("Missing 'filename'".to_string()))?;
        let path = self.download_dir.join(filename);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!("document already materialized at {}", path.display());
            return Ok(json!({ "file_path": path.to_string_lossy() }));
        }

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| AppError::Upstream(format!("could not create download dir: {e}")))?;

        let response = self
            .http
            .get(&request.url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "download failed: {} returned status {}",
                request.url,
                response.status()
            )));
        }

        let bytes: Bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Upstream(format!("download failed: {e}")))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Upstream(format!("could not write {}: {e}", path.display())))?;

        info!("downloaded {} to {}", request.url, path.display());
        Ok(json!({ "file_path": path.to_string_lossy() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_url_is_rejected() {
        let capability = FileFetchCapability::new("unused");
        let err = capability
            .perform(TASK_DOWNLOAD_FILE, json!({ "filename": "cv.pdf" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_existing_file_short_circuits_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.pdf");
        tokio::fs::write(&path, b"cached bytes").await.unwrap();

        let capability = FileFetchCapability::new(dir.path());
        // The URL is unreachable; the call must still succeed via the
        // materialized file.
        let result = capability
            .perform(
                TASK_DOWNLOAD_FILE,
                json!({ "url": "http://127.0.0.1:1/cv.pdf", "filename": "cv.pdf" }),
            )
            .await
            .unwrap();
        assert_eq!(result["file_path"], path.to_string_lossy().as_ref());
    }

    #[tokio::test]
    async fn test_filename_defaults_to_last_url_segment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume-final.pdf");
        tokio::fs::write(&path, b"cached bytes").await.unwrap();

        let capability = FileFetchCapability::new(dir.path());
        let result = capability
            .perform(
                TASK_DOWNLOAD_FILE,
                json!({ "url": "http://127.0.0.1:1/files/resume-final.pdf" }),
            )
            .await
            .unwrap();
        assert_eq!(result["file_path"], path.to_string_lossy().as_ref());
    }

    #[tokio::test]
    async fn test_directory_components_are_stripped_from_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.pdf");
        tokio::fs::write(&path, b"cached bytes").await.unwrap();

        let capability = FileFetchCapability::new(dir.path());
        let result = capability
            .perform(
                TASK_DOWNLOAD_FILE,
                json!({ "url": "http://127.0.0.1:1/x", "filename": "../../cv.pdf" }),
            )
            .await
            .unwrap();
        assert_eq!(result["file_path"], path.to_string_lossy().as_ref());
    }
}
