use thiserror::Error;

pub type Result<T, E = CoreError> = core::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("unsupported language pair: {0}")]
    UnsupportedPair(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("config: {0}")]
    Config(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable code reported next to the message by the protocol layer.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation_error",
            CoreError::UnsupportedPair(_) => "unsupported_pair",
            CoreError::NotFound(_) => "not_found",
            CoreError::InvalidStatus(_) => "invalid_status",
            CoreError::Storage(_) => "storage_error",
            CoreError::Config(_) => "config_error",
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}
