use thiserror::Error;

pub type Result<T> = std::result::Result<T, NominatimError>;

#[derive(Debug, Error)]
pub enum NominatimError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl NominatimError {
    /// Whether a retry could plausibly succeed: timeouts, connection failures,
    /// throttling and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            NominatimError::Network(_) | NominatimError::Timeout => true,
            NominatimError::Api { status, .. } => *status == 429 || *status >= 500,
            NominatimError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for NominatimError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NominatimError::Timeout
        } else if err.is_decode() {
            NominatimError::Parse(err.to_string())
        } else {
            NominatimError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NominatimError {
    fn from(err: serde_json::Error) -> Self {
        NominatimError::Parse(err.to_string())
    }
}
