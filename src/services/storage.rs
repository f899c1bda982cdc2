use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::config::environment::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object upload failed: {0}")]
    Upload(String),

    #[error("object delete failed: {0}")]
    Delete(String),

    #[error("object store call timed out after {0}s")]
    Timeout(u64),

    #[error("url does not belong to the configured bucket: {0}")]
    ForeignUrl(String),
}

/// Blob store seam. Movie images go through this so tests can swap in a fake.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload an object and return its public URL.
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, StorageError>;

    /// Delete an object previously returned by `upload`, addressed by that URL.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base: String,
    timeout_secs: u64,
}

impl S3Storage {
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "static",
            ));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared = loader.load().await;

        let mut builder = S3ConfigBuilder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            // MinIO and friends want path-style addressing
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base: public_base(
                config.endpoint.as_deref(),
                &config.bucket,
                &config.region,
            ),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Every store call is bounded; a hung connection surfaces as a
    /// distinct Timeout error instead of stalling the request.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, StorageError>
    where
        F: std::future::Future<Output = Result<T, StorageError>>,
    {
        tokio::time::timeout(std::time::Duration::from_secs(self.timeout_secs), fut)
            .await
            .map_err(|_| StorageError::Timeout(self.timeout_secs))?
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, StorageError> {
        self.bounded(async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(ByteStream::from(body))
                .content_type(content_type)
                .send()
                .await
                .map_err(|e| StorageError::Upload(e.to_string()))?;
            Ok(())
        })
        .await?;

        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = key_from_url(&self.public_base, url)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;

        self.bounded(async {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| StorageError::Delete(e.to_string()))?;
            Ok(())
        })
        .await
    }
}

fn public_base(endpoint: Option<&str>, bucket: &str, region: &str) -> String {
    match endpoint {
        Some(ep) => format!("{}/{}", ep.trim_end_matches('/'), bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
    }
}

fn key_from_url<'a>(public_base: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(public_base)?.strip_prefix('/')
}
