use facade_mock::SimulationError;

use super::{AreaError, RemoteError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Area error: {0}")]
    AreaError(#[from] AreaError),

    #[error("Remote error: {0}")]
    RemoteError(#[from] RemoteError),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Simulation error: {0}")]
    SimulationError(#[from] SimulationError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
