use thiserror::Error;

/// Custom error type for statusboard
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("config: {0}")]
    Config(String),

    #[error("parsing config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown check type: {0:?}")]
    UnsupportedCheck(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Asset error: {0}")]
    Asset(String),
}

/// Result type alias for statusboard
pub type Result<T> = std::result::Result<T, BoardError>;

impl BoardError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        BoardError::Config(msg.into())
    }

    /// Create an unsupported check type error
    pub fn unsupported_check<S: Into<String>>(kind: S) -> Self {
        BoardError::UnsupportedCheck(kind.into())
    }

    pub fn asset<S: Into<String>>(msg: S) -> Self {
        BoardError::Asset(msg.into())
    }
}
