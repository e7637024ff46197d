use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocsError {
    /// Write/read target without a usable extension.
    #[error("invalid document path '{path}': {reason}")]
    InvalidFilePath { path: String, reason: String },

    #[error("cannot project schema: {reason}")]
    Projection { reason: String },

    #[error("invalid document '{path}': {reason}")]
    InvalidDocument { path: String, reason: String },

    #[error("invalid manifest '{path}': {reason}")]
    Manifest { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl DocsError {
    pub(crate) fn projection(reason: impl Into<String>) -> Self {
        Self::Projection {
            reason: reason.into(),
        }
    }
}

pub type DocsResult<T> = Result<T, DocsError>;
