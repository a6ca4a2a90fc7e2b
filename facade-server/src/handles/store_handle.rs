use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use facade_api::ConfigAction;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ApiError, StoreError};
use crate::services::ConfigStore;

#[derive(Clone)]
pub struct StoreState {
    pub store: Arc<ConfigStore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConfig {
    pub identity: String,
    pub name: String,
    pub action: ConfigAction,
}

pub fn store_router(store_state: StoreState) -> Router {
    Router::new()
        .route("/store/:identity", get(get_configs))
        .route(
            "/store/:identity/*name",
            get(get_config).put(put_config).delete(delete_config),
        )
        .with_state(store_state)
}

pub async fn get_configs(
    State(state): State<StoreState>,
    Path(identity): Path<String>,
) -> Json<Vec<String>> {
    Json(state.store.list(&identity).await)
}

pub async fn get_config(
    State(state): State<StoreState>,
    Path((identity, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let name = name.trim_start_matches('/');
    let contents = state
        .store
        .get(&identity, name)
        .await
        .ok_or_else(|| StoreError::ConfigNotFound {
            identity: identity.clone(),
            name: name.to_string(),
        })?;

    Ok(Json(contents))
}

pub async fn put_config(
    State(state): State<StoreState>,
    Path((identity, name)): Path<(String, String)>,
    Json(contents): Json<Value>,
) -> Result<Json<StoredConfig>, ApiError> {
    let name = name.trim_start_matches('/').to_string();
    let action = state.store.store(&identity, &name, contents).await?;

    tracing::info!("Stored config {}/{} ({})", identity, name, action);

    Ok(Json(StoredConfig {
        identity,
        name,
        action,
    }))
}

pub async fn delete_config(
    State(state): State<StoreState>,
    Path((identity, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let name = name.trim_start_matches('/');
    state.store.delete(&identity, name).await?;

    tracing::info!("Deleted config {}/{}", identity, name);

    Ok(StatusCode::NO_CONTENT)
}
