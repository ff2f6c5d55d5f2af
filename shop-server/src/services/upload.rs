//! Image upload
//!
//! Validates uploaded images and hands them to a [`BlobStore`], which returns
//! the public URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{AppError, AppResult, ErrorCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum file size (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Accepted image extensions
pub const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub size: usize,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `name`, returning its public URL
    async fn put(&self, name: &str, data: Vec<u8>) -> AppResult<String>;

    /// Stored bytes, or `None` if nothing is stored under `name`
    async fn get(&self, name: &str) -> AppResult<Option<Vec<u8>>>;
}

/// Blob store on the local filesystem
pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    /// `url_prefix` is joined with the stored name to form the public URL
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: Vec<u8>) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create upload directory: {e}")))?;
        tokio::fs::write(self.root.join(name), data)
            .await
            .map_err(|e| AppError::internal(format!("Failed to write upload: {e}")))?;
        Ok(format!("{}/{}", self.url_prefix, name))
    }

    async fn get(&self, name: &str) -> AppResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::internal(format!("Failed to read upload: {e}"))),
        }
    }
}

/// Lower-cased extension of `filename`, if it is a supported image type
fn image_extension(filename: &str) -> AppResult<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!(
                "Unsupported file format '{}'. Supported: {}",
                ext,
                SUPPORTED_FORMATS.join(", ")
            ),
        ));
    }
    Ok(ext)
}

/// Stored names are generated by us; anything else is rejected
fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains("..") && !name.contains('/') && !name.contains('\\')
}

#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn BlobStore>,
}

impl UploadService {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub async fn upload_image(&self, original_name: &str, data: Vec<u8>) -> AppResult<UploadResponse> {
        let ext = image_extension(original_name)?;
        if data.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::with_message(
                ErrorCode::FileTooLarge,
                format!("File too large. Maximum size is {}MB", MAX_FILE_SIZE / 1024 / 1024),
            )
            .with_detail("max_bytes", MAX_FILE_SIZE as u64));
        }

        let size = data.len();
        let filename = format!(
            "{}_{}.{}",
            chrono::Utc::now().timestamp(),
            uuid::Uuid::new_v4().simple(),
            ext
        );
        let url = self.store.put(&filename, data).await?;

        tracing::info!(filename = %filename, size, "Image uploaded");
        Ok(UploadResponse {
            url,
            filename,
            original_name: original_name.to_string(),
            size,
        })
    }

    /// Bytes and extension of a stored upload
    pub async fn read(&self, name: &str) -> AppResult<(Vec<u8>, String)> {
        if !is_safe_name(name) {
            return Err(AppError::validation("Invalid filename"));
        }
        let ext = image_extension(name)?;
        self.store
            .get(name)
            .await?
            .map(|bytes| (bytes, ext))
            .ok_or_else(|| AppError::not_found(format!("File {name}")))
    }
}
