use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use facade_api::DeviceCategory;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::sync::{Mutex, RwLock};

use crate::errors::SimulationError;

/// `[timestamp, value]` pair served by a read-only server.
pub type SimulatedPoint = (Value, Value);

pub const DEFAULT_VALUE_FIELD: &str = "value";
pub const INITIAL_VALUE: i64 = -1;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Document stored under `servers/<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Device category the server imitates
    #[serde(rename = "type")]
    pub server_type: String,
    /// URL path served
    pub endpoint: String,
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Body field carrying the value of read-write servers
    #[serde(default)]
    pub value_field: Option<String>,
    /// Series per category name, replayed in a loop by read-only servers
    #[serde(default)]
    pub simulated_values: BTreeMap<String, Vec<SimulatedPoint>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerKind {
    ReadOnly { values: Vec<SimulatedPoint> },
    ReadWrite { value_field: String },
}

impl ServerConfig {
    pub fn from_contents(contents: &Value) -> Result<Self, SimulationError> {
        Ok(Self::deserialize(contents)?)
    }

    pub fn category(&self) -> Result<DeviceCategory, SimulationError> {
        Ok(self.server_type.parse::<DeviceCategory>()?)
    }

    pub fn kind(&self) -> Result<ServerKind, SimulationError> {
        let category = self.category()?;

        if category.is_writable() {
            let value_field = self
                .value_field
                .clone()
                .unwrap_or_else(|| DEFAULT_VALUE_FIELD.to_string());
            return Ok(ServerKind::ReadWrite { value_field });
        }

        self.simulated_values
            .get(category.as_str())
            .filter(|values| !values.is_empty())
            .map(|values| ServerKind::ReadOnly {
                values: values.clone(),
            })
            .ok_or(SimulationError::MissingSimulatedValues(category))
    }

    /// Endpoint as a route path.
    pub fn path(&self) -> Result<String, SimulationError> {
        let path = if self.endpoint.starts_with('/') {
            self.endpoint.clone()
        } else {
            format!("/{}", self.endpoint)
        };

        if path.len() < 2 || path.contains([':', '*', '{', '}']) {
            return Err(SimulationError::InvalidEndpoint(self.endpoint.clone()));
        }

        Ok(path)
    }

    /// Routes of the simulated device.
    pub fn router(&self) -> Result<Router, SimulationError> {
        let path = self.path()?;

        Ok(match self.kind()? {
            ServerKind::ReadOnly { values } => Router::new()
                .route(&path, get(read_point))
                .with_state(ReadOnlyState {
                    values: Arc::new(values),
                    cursor: Arc::new(Mutex::new(0)),
                }),
            ServerKind::ReadWrite { value_field } => Router::new()
                .route(&path, get(get_value).post(set_value))
                .with_state(ReadWriteState {
                    value_field: Arc::new(value_field),
                    value: Arc::new(RwLock::new(json!(INITIAL_VALUE))),
                }),
        })
    }
}

#[derive(Clone)]
struct ReadOnlyState {
    values: Arc<Vec<SimulatedPoint>>,
    cursor: Arc<Mutex<usize>>,
}

#[derive(Clone)]
struct ReadWriteState {
    value_field: Arc<String>,
    value: Arc<RwLock<Value>>,
}

async fn read_point(State(state): State<ReadOnlyState>) -> Json<Value> {
    let mut cursor = state.cursor.lock().await;
    let (timestamp, value) = state.values[*cursor].clone();
    *cursor = (*cursor + 1) % state.values.len();

    Json(json!({"timestamp": timestamp, "value": value}))
}

async fn get_value(State(state): State<ReadWriteState>) -> Json<Value> {
    let mut body = Map::new();
    body.insert(state.value_field.to_string(), state.value.read().await.clone());

    Json(Value::Object(body))
}

async fn set_value(State(state): State<ReadWriteState>, Json(body): Json<Value>) -> Response {
    match body.get(state.value_field.as_str()) {
        Some(value) if !value.is_null() => {
            *state.value.write().await = value.clone();
            tracing::debug!("{} updated to {}", state.value_field, value);

            Json(json!({"message": "value updated", "value": value})).into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "value not provided"})),
        )
            .into_response(),
    }
}
