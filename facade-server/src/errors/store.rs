use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Config not found: {identity}/{name}")]
    ConfigNotFound { identity: String, name: String },

    #[error("Invalid config name: {0}")]
    InvalidName(String),

    #[error("Invalid config document {path}: {source}")]
    InvalidDocument {
        path: String,
        source: serde_json::Error,
    },

    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::ConfigNotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::InvalidName(_) => StatusCode::BAD_REQUEST,
            StoreError::InvalidDocument { .. } => StatusCode::BAD_REQUEST,
            StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
