//! Error taxonomy shared by the HTTP client, poll loops and views.

use thiserror::Error;

/// Failure of one fetch or submission.
///
/// Every variant owns its message so the same error can be logged by the
/// scheduler and forwarded to the view that issued the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network, timeout or unexpected HTTP status. Retried by the next tick.
    #[error("transient fetch error: {0}")]
    Transient(String),

    /// Body did not match the expected shape. The tick renders nothing.
    #[error("malformed payload: {0}")]
    DataShape(String),

    /// Backend refused access (401/403).
    #[error("access denied")]
    AccessDenied,

    /// Backend answered with an `{"error": "..."}` body.
    #[error("backend error: {0}")]
    Api(String),

    /// A render target the loop refers to does not exist in its view.
    #[error("configuration error: {0}")]
    FatalConfig(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::DataShape(e.to_string());
        }
        match e.status() {
            Some(s) if s == reqwest::StatusCode::FORBIDDEN || s == reqwest::StatusCode::UNAUTHORIZED => {
                Self::AccessDenied
            }
            _ => Self::Transient(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::DataShape(e.to_string())
    }
}

/// Chart sink failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("chart surface '{0}' is not declared in this view")]
    UnknownSurface(String),
}

impl From<ChartError> for FetchError {
    fn from(e: ChartError) -> Self {
        Self::FatalConfig(e.to_string())
    }
}
