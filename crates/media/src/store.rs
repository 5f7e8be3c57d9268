//! Object store wrapper.

use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use secrecy::ExposeSecret;
use tracing::instrument;
use uuid::Uuid;

use crate::{ImageKind, MediaError, StorageBackend, StorageConfig};

/// A file read back from storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// File contents.
    pub bytes: Bytes,
    /// MIME type derived from the extension.
    pub content_type: &'static str,
}

/// Handle to the configured object store.
///
/// Cheap to clone; all clones share the same backend.
#[derive(Clone)]
pub struct MediaStore {
    store: Arc<dyn ObjectStore>,
    public_base_url: Arc<str>,
}

impl std::fmt::Debug for MediaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStore")
            .field("store", &self.store.to_string())
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl MediaStore {
    /// Build the store for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the local root cannot be created or the S3
    /// client cannot be built.
    pub fn from_config(config: &StorageConfig) -> Result<Self, MediaError> {
        let store: Arc<dyn ObjectStore> = match &config.backend {
            StorageBackend::Local { root } => {
                std::fs::create_dir_all(root).map_err(|e| {
                    MediaError::Config(format!("cannot create {}: {e}", root.display()))
                })?;
                Arc::new(LocalFileSystem::new_with_prefix(root)?)
            }
            StorageBackend::S3(s3) => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&s3.bucket)
                    .with_region(&s3.region);
                if let Some(endpoint) = &s3.endpoint {
                    builder = builder
                        .with_endpoint(endpoint)
                        .with_allow_http(endpoint.starts_with("http://"));
                }
                if let (Some(key_id), Some(secret)) = (&s3.access_key_id, &s3.secret_access_key) {
                    builder = builder
                        .with_access_key_id(key_id)
                        .with_secret_access_key(secret.expose_secret());
                }
                Arc::new(builder.build()?)
            }
            StorageBackend::Memory => Arc::new(InMemory::new()),
        };

        Ok(Self {
            store,
            public_base_url: config.public_base_url.as_str().into(),
        })
    }

    /// In-memory store for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            public_base_url: StorageConfig::DEFAULT_PUBLIC_URL.into(),
        }
    }

    /// Store an image under `prefix/` with a random file name.
    ///
    /// Returns the object path to record in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is invalid or the write fails.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn put_image(
        &self,
        prefix: &str,
        kind: ImageKind,
        data: Bytes,
    ) -> Result<String, MediaError> {
        let name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        let path = format!("{}/{name}", prefix.trim_matches('/'));
        self.put(&path, data).await?;
        Ok(path)
    }

    /// Write raw bytes to `path`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the write fails.
    pub async fn put(&self, path: &str, data: Bytes) -> Result<(), MediaError> {
        let location = parse_path(path)?;
        self.store.put(&location, PutPayload::from(data)).await?;
        tracing::debug!(path, "Stored object");
        Ok(())
    }

    /// Read an object.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotFound` if nothing is stored at `path`.
    pub async fn get(&self, path: &str) -> Result<StoredFile, MediaError> {
        let location = parse_path(path)?;
        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Err(MediaError::NotFound),
            Err(e) => return Err(e.into()),
        };
        let bytes = result.bytes().await?;
        let content_type = ImageKind::from_path(path)
            .map_or("application/octet-stream", |kind| kind.content_type());
        Ok(StoredFile {
            bytes,
            content_type,
        })
    }

    /// Delete an object. Missing objects are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend fails.
    pub async fn delete(&self, path: &str) -> Result<(), MediaError> {
        let location = parse_path(path)?;
        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Public URL for an object under the public prefix.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }
}

fn parse_path(path: &str) -> Result<Path, MediaError> {
    if path.is_empty() || path.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(MediaError::InvalidPath(path.to_owned()));
    }
    Path::parse(path).map_err(|_| MediaError::InvalidPath(path.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[tokio::test]
    async fn test_put_image_and_read_back() {
        let media = MediaStore::in_memory();
        let path = media
            .put_image("payment-proofs/KS-260114-7XK2QP", ImageKind::Png, Bytes::from_static(PNG))
            .await
            .unwrap();

        assert!(path.starts_with("payment-proofs/KS-260114-7XK2QP/"));
        assert!(path.ends_with(".png"));

        let file = media.get(&path).await.unwrap();
        assert_eq!(file.bytes.as_ref(), PNG);
        assert_eq!(file.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_missing_object() {
        let media = MediaStore::in_memory();
        assert!(matches!(
            media.get("products/none.png").await,
            Err(MediaError::NotFound)
        ));
        media.delete("products/none.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let media = MediaStore::in_memory();
        assert!(matches!(
            media.get("products/../payment-proofs/x.png").await,
            Err(MediaError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_public_url() {
        let media = MediaStore::in_memory();
        assert_eq!(media.public_url("products/a.png"), "/media/products/a.png");
    }
}
