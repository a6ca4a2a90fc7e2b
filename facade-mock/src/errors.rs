use std::io;

use facade_api::{DeviceCategory, UnsupportedCategory};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Invalid server config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("Unsupported server type: {0}")]
    UnsupportedType(String),

    #[error("No simulated values for {0}")]
    MissingSimulatedValues(DeviceCategory),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("Server not found: {0}")]
    ServerNotFound(String),
}

impl From<UnsupportedCategory> for SimulationError {
    fn from(e: UnsupportedCategory) -> Self {
        SimulationError::UnsupportedType(e.0)
    }
}
