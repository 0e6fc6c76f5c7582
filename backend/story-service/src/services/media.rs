/// Remote image storage delegate
///
/// Stories keep a durable public URL plus an opaque object key; the key is
/// the deletion handle. The production implementation targets S3 or any
/// S3-compatible store (MinIO etc. via a custom endpoint).
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::{AppError, Result};

/// Result of a successful upload: a fetchable URL and the deletion handle.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Deleted,
    NotFound,
}

/// Abstraction over the remote image host.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Transfer a local file to remote storage. Must complete before the
    /// story record is created so the record stores a valid URL.
    async fn upload(&self, local_path: &Path, content_type: &str) -> Result<StoredImage>;

    /// Remove a previously uploaded object by its handle.
    async fn destroy(&self, key: &str) -> Result<DestroyOutcome>;
}

/// Map an uploaded filename to a supported image content type.
pub fn content_type_for(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit('.').next()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// S3-backed image store.
pub struct S3ImageStore {
    client: Client,
    config: MediaConfig,
}

impl S3ImageStore {
    /// Build an S3 client from config. Explicit credentials and a custom
    /// endpoint are optional; without them the default AWS chain applies.
    pub async fn new(config: MediaConfig) -> Self {
        use aws_sdk_s3::config::Region;

        let mut aws_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            use aws_sdk_s3::config::Credentials;

            let credentials =
                Credentials::new(access_key_id, secret_access_key, None, None, "story_service_s3");
            aws_config_builder = aws_config_builder.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            aws_config_builder = aws_config_builder.endpoint_url(endpoint);
        }

        let aws_config = aws_config_builder.load().await;

        Self {
            client: Client::new(&aws_config),
            config,
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            key
        )
    }

    /// Verify bucket connectivity at startup. Story creation depends
    /// entirely on the image store; refusing to start beats failing every
    /// create request at runtime.
    pub async fn health_check(&self) -> Result<()> {
        match self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .max_keys(1)
            .send()
            .await
        {
            Ok(_) => {
                tracing::info!(
                    "image store validated (bucket: {}, region: {})",
                    self.config.bucket,
                    self.config.region
                );
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                let guidance = if error_msg.contains("InvalidAccessKeyId") {
                    "Invalid AWS Access Key ID. Check AWS_ACCESS_KEY_ID."
                } else if error_msg.contains("SignatureDoesNotMatch") {
                    "Invalid AWS Secret Access Key. Check AWS_SECRET_ACCESS_KEY."
                } else if error_msg.contains("NoSuchBucket") {
                    "Bucket does not exist. Check MEDIA_BUCKET."
                } else if error_msg.contains("AccessDenied") {
                    "Access denied. Ensure the IAM user/role has S3 permissions."
                } else {
                    "Ensure the bucket is accessible and credentials are valid."
                };

                tracing::error!("image store health check failed: {}", error_msg);
                tracing::error!("  bucket: {}", self.config.bucket);
                tracing::error!("  guidance: {}", guidance);

                Err(AppError::Media(format!(
                    "image store health check failed: {}. {}",
                    error_msg, guidance
                )))
            }
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(&self, local_path: &Path, content_type: &str) -> Result<StoredImage> {
        if !local_path.exists() {
            return Err(AppError::Media(format!(
                "local file not found: {}",
                local_path.display()
            )));
        }

        let key = format!(
            "stories/{}.{}",
            Uuid::new_v4(),
            extension_for(content_type)
        );

        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            AppError::Media(format!(
                "failed to read file {}: {}",
                local_path.display(),
                e
            ))
        })?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(body)
            .content_type(content_type)
            // Object keys are unique per upload, so long-lived caching is safe.
            .cache_control("max-age=31536000")
            .send()
            .await
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("403") || error_msg.contains("Forbidden") {
                    AppError::Media("image store auth failed (403): check AWS credentials".into())
                } else if error_msg.contains("NoSuchBucket") {
                    AppError::Media(format!("bucket not found: {}", self.config.bucket))
                } else {
                    AppError::Media(format!("image upload failed: {}", e))
                }
            })?;

        Ok(StoredImage {
            url: self.public_url(&key),
            key,
        })
    }

    async fn destroy(&self, key: &str) -> Result<DestroyOutcome> {
        // S3 deletes are idempotent, so probe first to distinguish a real
        // deletion from a missing handle.
        let exists = match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("404") || error_msg.contains("NotFound") {
                    false
                } else {
                    return Err(AppError::Media(format!(
                        "failed to check object {}: {}",
                        key, e
                    )));
                }
            }
        };

        if !exists {
            return Ok(DestroyOutcome::NotFound);
        }

        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Media(format!("image delete failed: {}", e)))?;

        Ok(DestroyOutcome::Deleted)
    }
}
