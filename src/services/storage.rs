//! Blob storage for document files.
//!
//! [`StorageGateway`] abstracts the blob store. [`S3Storage`] talks to AWS S3
//! or MinIO; [`MemoryStorage`] keeps blobs in process for development and tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, StorageBackend, StorageSettings};
use crate::error::{AppError, AppResult};

/// Lifetime of presigned download URLs.
const PRESIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Blob store consumed by the document service.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Store bytes at `path`, returning the stored path.
    async fn put(&self, path: &str, data: Vec<u8>, content_type: Option<&str>)
    -> AppResult<String>;

    /// Read bytes and content type stored at `path`.
    async fn get(&self, path: &str) -> AppResult<(Vec<u8>, Option<String>)>;

    /// Retrievable URL for `path`.
    async fn url(&self, path: &str) -> AppResult<String>;

    /// Check if a blob exists at `path`.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Delete the blob at `path`. Deleting a missing blob succeeds.
    async fn delete(&self, path: &str) -> AppResult<()>;
}

/// Build the configured storage backend.
pub async fn connect(config: &Config) -> AppResult<Arc<dyn StorageGateway>> {
    match config.storage_backend {
        StorageBackend::S3 => Ok(Arc::new(S3Storage::new(&config.storage).await?)),
        StorageBackend::Memory => {
            info!("Using in-memory storage; files are lost on restart");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

/// Run a storage call with a deadline, mapping expiry to `Storage`.
pub async fn with_timeout<T, F>(timeout: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Storage(format!(
            "{} timed out after {}s",
            operation,
            timeout.as_secs_f32()
        ))),
    }
}

/// Build the blob key for a document file.
///
/// Format: `documents/{student_id}/{document_id}/{file_id}.{ext}`
pub fn document_key(student_id: Uuid, document_id: Uuid, file_id: Uuid, extension: &str) -> String {
    format!(
        "documents/{}/{}/{}.{}",
        student_id, document_id, file_id, extension
    )
}

/// Get the content type for a file based on its extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// S3 storage client wrapper.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3 storage client from configuration.
    pub async fn new(config: &StorageSettings) -> AppResult<Self> {
        let credentials =
            Credentials::new(&config.access_key, &config.secret_key, None, None, "student-docs");

        let region = Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        // Use custom endpoint for MinIO in development
        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        let storage = Self {
            client,
            bucket: config.bucket.clone(),
        };

        storage.ensure_bucket_exists().await?;

        info!("S3 storage initialized: bucket={}", config.bucket);

        Ok(storage)
    }

    /// Ensure the bucket exists, creating it if necessary.
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    info!("Creating S3 bucket '{}'", self.bucket);
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::Storage(format!("Failed to create bucket: {}", e))
                        })?;
                    Ok(())
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to access bucket '{}': {}",
                        self.bucket, service_error
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl StorageGateway for S3Storage {
    async fn put(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> AppResult<String> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file to S3: {}", e)))?;

        Ok(path.to_string())
    }

    async fn get(&self, path: &str) -> AppResult<(Vec<u8>, Option<String>)> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(format!("Blob {}", path))
                } else {
                    AppError::Storage(format!("Failed to get file from S3: {}", service_error))
                }
            })?;

        let content_type = response.content_type().map(String::from);
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read S3 response body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok((data, content_type))
    }

    async fn url(&self, path: &str) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(PRESIGNED_URL_TTL)
            .map_err(|e| AppError::Storage(format!("Invalid presigning config: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to presign S3 URL: {}", e)))?;

        Ok(request.uri().to_string())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to check S3 object: {}",
                        service_error
                    )))
                }
            }
        }
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file from S3: {}", e)))?;

        Ok(())
    }
}

/// In-process blob store.
///
/// Failures can be injected to exercise rollback and best-effort deletion.
#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, (Vec<u8>, Option<String>)>>,
    fail_puts: AtomicBool,
    failing_deletes: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make `delete` fail for one path.
    pub fn fail_delete_of(&self, path: impl Into<String>) {
        if let Ok(mut failing) = self.failing_deletes.lock() {
            failing.insert(path.into());
        }
    }

    /// Delay every call, to exercise timeouts.
    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut current) = self.delay.lock() {
            *current = delay;
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .blobs
            .lock()
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    async fn pause(&self) {
        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn blobs(
        &self,
    ) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, (Vec<u8>, Option<String>)>>> {
        self.blobs
            .lock()
            .map_err(|_| AppError::Storage("memory storage lock poisoned".into()))
    }
}

#[async_trait]
impl StorageGateway for MemoryStorage {
    async fn put(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> AppResult<String> {
        self.pause().await;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("injected put failure for {}", path)));
        }
        self.blobs()?
            .insert(path.to_string(), (data, content_type.map(String::from)));
        Ok(path.to_string())
    }

    async fn get(&self, path: &str) -> AppResult<(Vec<u8>, Option<String>)> {
        self.pause().await;
        self.blobs()?
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Blob {}", path)))
    }

    async fn url(&self, path: &str) -> AppResult<String> {
        Ok(format!("memory://{}", path))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.pause().await;
        Ok(self.blobs()?.contains_key(path))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.pause().await;
        let failing = self
            .failing_deletes
            .lock()
            .map(|f| f.contains(path))
            .unwrap_or(false);
        if failing {
            return Err(AppError::Storage(format!(
                "injected delete failure for {}",
                path
            )));
        }
        self.blobs()?.remove(path);
        Ok(())
    }
}
