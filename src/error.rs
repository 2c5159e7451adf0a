use thiserror::Error;

/// Library error type for gallery operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured photo library root is missing or not a directory.
    #[error("invalid photo library directory: {0}")]
    BadDir(String),

    /// The asset source rejected a mutation (favorite toggle, deletion).
    #[error("asset source rejected {op}: {reason}")]
    SourceRejected { op: &'static str, reason: String },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde preferences error.
    #[error(transparent)]
    Prefs(#[from] serde_yaml::Error),
}
