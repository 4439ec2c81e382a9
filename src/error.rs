use thiserror::Error;

/// Failures of a call to the completion endpoint.
///
/// Breakdown and insight requests absorb these into their local fallback;
/// only the brain-dump path hands them to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("response has no completion text")]
    MissingCompletion,

    #[error("no JSON found in completion")]
    NoJson,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("response missing required field '{0}'")]
    MissingFields(&'static str),
}

impl GatewayError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::Status(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}
