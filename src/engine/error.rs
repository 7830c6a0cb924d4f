use thiserror::Error;

/// Precondition failures detected before a session starts. None of these can
/// occur once a session is running.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("character pool is empty")]
    EmptyPool,
    #[error("character {0} has no accepted answers")]
    NoAnswers(String),
    #[error("time limit must be positive")]
    ZeroTimeLimit,
    #[error("pause threshold must be at least 1")]
    ZeroPauseThreshold,
    #[error("invalid combo table: {0}")]
    InvalidComboTable(String),
    #[error("timer compression factor {0} must be in (0, 1]")]
    InvalidCompression(f64),
    #[error("invalid mode settings: {0}")]
    InvalidMode(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("missing catalog asset {0}")]
    MissingAsset(String),
    #[error("malformed catalog asset {name}: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog selection matched no characters")]
    EmptySelection,
}
