//! Storage backend configuration.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::MediaError;

/// Where uploaded files are kept.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// A directory on the local filesystem.
    Local {
        /// Root directory (created on startup if missing).
        root: PathBuf,
    },
    /// An S3-compatible bucket.
    S3(S3Config),
    /// Process memory; contents vanish on restart.
    Memory,
}

/// S3-compatible bucket settings.
///
/// Without static keys the default AWS credential chain is used.
#[derive(Clone)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// Region (default `us-east-1`).
    pub region: String,
    /// Custom endpoint for MinIO, R2 and similar.
    pub endpoint: Option<String>,
    /// Static access key ID.
    pub access_key_id: Option<String>,
    /// Static secret access key.
    pub secret_access_key: Option<SecretString>,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Storage configuration shared by both services.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected backend.
    pub backend: StorageBackend,
    /// Base URL for public objects; `/media` when served by the storefront.
    pub public_base_url: String,
}

impl StorageConfig {
    /// Default local storage directory.
    pub const DEFAULT_LOCAL_ROOT: &'static str = "./data/media";

    /// Default public URL prefix.
    pub const DEFAULT_PUBLIC_URL: &'static str = "/media";

    /// In-memory storage for tests.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            public_base_url: Self::DEFAULT_PUBLIC_URL.to_owned(),
        }
    }

    /// Load from `STORAGE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Config` for an unknown backend or a missing
    /// bucket name.
    pub fn from_env() -> Result<Self, MediaError> {
        let backend = match env("STORAGE_BACKEND").as_deref().unwrap_or("local") {
            "local" => StorageBackend::Local {
                root: env("STORAGE_LOCAL_ROOT")
                    .unwrap_or_else(|| Self::DEFAULT_LOCAL_ROOT.to_owned())
                    .into(),
            },
            "s3" => StorageBackend::S3(S3Config {
                bucket: env("STORAGE_S3_BUCKET").ok_or_else(|| {
                    MediaError::Config("STORAGE_S3_BUCKET is required for the s3 backend".into())
                })?,
                region: env("STORAGE_S3_REGION").unwrap_or_else(|| "us-east-1".to_owned()),
                endpoint: env("STORAGE_S3_ENDPOINT"),
                access_key_id: env("STORAGE_S3_ACCESS_KEY_ID"),
                secret_access_key: env("STORAGE_S3_SECRET_ACCESS_KEY").map(SecretString::from),
            }),
            "memory" => StorageBackend::Memory,
            other => {
                return Err(MediaError::Config(format!(
                    "STORAGE_BACKEND must be local, s3 or memory, got {other}"
                )));
            }
        };

        let public_base_url = env("STORAGE_PUBLIC_URL")
            .unwrap_or_else(|| Self::DEFAULT_PUBLIC_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        Ok(Self {
            backend,
            public_base_url,
        })
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_debug_redacts_secret() {
        let config = S3Config {
            bucket: "shop-media".to_owned(),
            region: "auto".to_owned(),
            endpoint: Some("https://r2.example.com".to_owned()),
            access_key_id: Some("AKIAEXAMPLE".to_owned()),
            secret_access_key: Some(SecretString::from("wJalrXUtnFEMI/K7MDENG")),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("shop-media"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
    }

    #[test]
    fn test_memory_defaults() {
        let config = StorageConfig::memory();
        assert!(matches!(config.backend, StorageBackend::Memory));
        assert_eq!(config.public_base_url, "/media");
    }
}
