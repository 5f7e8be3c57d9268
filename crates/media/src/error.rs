//! Media error types.

/// Errors from validating or storing uploaded files.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The upload was empty.
    #[error("file is empty")]
    Empty,

    /// The upload exceeds the size limit.
    #[error("file exceeds {max_bytes} bytes")]
    TooLarge {
        /// Configured limit.
        max_bytes: usize,
    },

    /// The file is not a JPEG, PNG or WebP image.
    #[error("unsupported file type; expected JPEG, PNG or WebP")]
    UnsupportedType,

    /// The object path is malformed or escapes its prefix.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// No object at the path.
    #[error("file not found")]
    NotFound,

    /// Storage backend configuration is invalid.
    #[error("storage configuration error: {0}")]
    Config(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] object_store::Error),
}

impl MediaError {
    /// Whether the error was caused by the uploaded file rather than the
    /// backend.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::TooLarge { .. } | Self::UnsupportedType | Self::InvalidPath(_)
        )
    }
}
