use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeropickError>;

#[derive(Debug, Error)]
pub enum HeropickError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("missing domain in URL")]
    MissingDomain,

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("storage error during {operation}: {reason}")]
    Storage { operation: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl HeropickError {
    pub fn fetch_error(url: &str, reason: &str) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn browser_error(reason: impl Into<String>) -> Self {
        Self::Browser(reason.into())
    }

    pub fn storage_error(operation: &str, reason: &str) -> Self {
        Self::Storage {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}

/* Conversions so `?` works smoothly */
impl From<std::io::Error> for HeropickError {
    fn from(e: std::io::Error) -> Self {
        HeropickError::Other(e.to_string())
    }
}
impl From<serde_json::Error> for HeropickError {
    fn from(e: serde_json::Error) -> Self {
        HeropickError::Other(e.to_string())
    }
}
impl From<reqwest::Error> for HeropickError {
    fn from(e: reqwest::Error) -> Self {
        HeropickError::Other(e.to_string())
    }
}
impl From<url::ParseError> for HeropickError {
    fn from(e: url::ParseError) -> Self {
        HeropickError::InvalidUrl(e.to_string())
    }
}
