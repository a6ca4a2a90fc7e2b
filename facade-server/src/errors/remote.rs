use axum::http::StatusCode;

/// Failure of a call to a collaborating service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("{0} timed out")]
    Timeout(String),

    #[error("{0} rejected the call: {1}")]
    Rejected(String, String),

    #[error("{0} is unavailable")]
    Unavailable(String),
}

impl RemoteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RemoteError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RemoteError::Rejected(_, _) => StatusCode::BAD_GATEWAY,
            RemoteError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
