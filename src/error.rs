use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to fetch index: {0}")]
    Fetch(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not valid UTF-8")]
    Decode,

    #[error("integrity check failed: {0}")]
    Integrity(String),
}

impl GeneratorError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        GeneratorError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
