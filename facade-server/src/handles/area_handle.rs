use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use facade_api::{AreaConfig, AreaSummary};

use crate::errors::{ApiError, AreaError};
use crate::services::AreaController;

#[derive(Clone)]
pub struct AreaState {
    pub controller: Arc<AreaController>,
}

pub fn area_router(area_state: AreaState) -> Router {
    Router::new()
        .route("/areas", get(get_areas))
        .route("/areas/:name", get(get_area))
        .route("/areas/:name/summary", get(get_area_summary))
        .route("/summary", get(get_summaries))
        .with_state(area_state)
}

pub async fn get_areas(State(state): State<AreaState>) -> Json<Vec<String>> {
    Json(state.controller.registry().names().await)
}

pub async fn get_area(
    State(state): State<AreaState>,
    Path(name): Path<String>,
) -> Result<Json<AreaConfig>, ApiError> {
    let area = state
        .controller
        .registry()
        .get(&name)
        .await
        .ok_or(AreaError::AreaNotFound(name))?;

    Ok(Json(area))
}

pub async fn get_area_summary(
    State(state): State<AreaState>,
    Path(name): Path<String>,
) -> Result<Json<AreaSummary>, ApiError> {
    Ok(Json(state.controller.get_summary(&name).await?))
}

pub async fn get_summaries(State(state): State<AreaState>) -> Json<BTreeMap<String, AreaSummary>> {
    Json(state.controller.get_summaries().await)
}
