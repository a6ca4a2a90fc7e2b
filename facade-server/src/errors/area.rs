use axum::http::StatusCode;
use facade_api::UnsupportedCategory;

#[derive(Debug, thiserror::Error)]
pub enum AreaError {
    #[error("Area not found: {0}")]
    AreaNotFound(String),

    #[error("Invalid area document: {0}")]
    InvalidContents(#[from] serde_json::Error),

    #[error(transparent)]
    UnsupportedCategory(#[from] UnsupportedCategory),
}

impl AreaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AreaError::AreaNotFound(_) => StatusCode::NOT_FOUND,
            AreaError::InvalidContents(_) => StatusCode::BAD_REQUEST,
            AreaError::UnsupportedCategory(_) => StatusCode::BAD_REQUEST,
        }
    }
}
