use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use facade_mock::{ServerStatus, ServerSupervisor};
use serde_json::{Value, json};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct SimulationState {
    pub supervisor: Arc<ServerSupervisor>,
}

pub fn simulation_router(simulation_state: SimulationState) -> Router {
    Router::new()
        .route("/simulation", get(get_servers))
        .route("/simulation/reset", post(reset_all_servers))
        .route("/simulation/:name/stop", post(stop_server))
        .route("/simulation/:name/reset", post(reset_server))
        .with_state(simulation_state)
}

pub async fn get_servers(State(state): State<SimulationState>) -> Json<Vec<ServerStatus>> {
    Json(state.supervisor.status().await)
}

pub async fn stop_server(
    State(state): State<SimulationState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.supervisor.stop_server(&name).await?;

    Ok(Json(json!({"name": name, "stopped": true})))
}

pub async fn reset_server(
    State(state): State<SimulationState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let address: SocketAddr = state.supervisor.reset_server(&name).await?;

    Ok(Json(json!({"name": name, "address": address})))
}

pub async fn reset_all_servers(State(state): State<SimulationState>) -> Json<Value> {
    let started = state.supervisor.reset_all_servers().await;

    Json(json!({"started": started}))
}
