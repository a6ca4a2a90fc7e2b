pub mod api;
pub mod area;
pub mod remote;
pub mod store;

pub use api::ApiError;
pub use area::AreaError;
pub use remote::RemoteError;
pub use store::StoreError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use facade_mock::SimulationError;
use serde_json::json;
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, log_message) = match self {
            ApiError::AreaError(e) => (e.status_code(), e.to_string(), None),
            ApiError::RemoteError(e) => (e.status_code(), e.to_string(), None),
            ApiError::StoreError(StoreError::Io(e)) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
            ApiError::StoreError(e) => (e.status_code(), e.to_string(), None),
            ApiError::SimulationError(e) => (simulation_status(&e), e.to_string(), None),
            ApiError::InternalError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
        };

        let mut error_obj = json!({
            "code": status.as_u16(),
            "message": error_message
        });

        if let Some(error_id) = log_message {
            error_obj["error_id"] = json!(error_id);
        }

        let body = Json(json!({
            "error": error_obj
        }));

        (status, body).into_response()
    }
}

fn simulation_status(error: &SimulationError) -> StatusCode {
    match error {
        SimulationError::ServerNotFound(_) => StatusCode::NOT_FOUND,
        SimulationError::Bind { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_REQUEST,
    }
}
