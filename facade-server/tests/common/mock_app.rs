use std::future::Future;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use facade_api::Sample;
use facade_server::app::{Agents, Platform, create_router};
use facade_server::configs::{Control, Simulation};
use facade_server::services::ConfigStore;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;

pub const CONTROLLER: &str = "ofc.area_controller";
pub const ALGORITHM: &str = "ofc.control_algorithm";

pub struct MockApp {
    pub control: Control,
    pub platform: Platform,
    pub agents: Agents,
    pub router: Router,
}

impl MockApp {
    pub async fn new() -> Self {
        Self::build(Simulation::default()).await
    }

    /// App that also runs the simulated device servers.
    pub async fn with_simulation() -> Self {
        Self::build(Simulation {
            enabled: true,
            ..Simulation::default()
        })
        .await
    }

    async fn build(simulation: Simulation) -> Self {
        let control = Control {
            period_secs: 1,
            historian_timeout_secs: 1,
            actuator_timeout_secs: 1,
            ..Control::default()
        };
        let platform = Platform::new(ConfigStore::new());
        let agents = Agents::start(&control, &simulation, &platform).await;
        let router = create_router(&control, &platform, &agents);

        Self {
            control,
            platform,
            agents,
            router,
        }
    }

    pub async fn store_area(&self, name: &str, contents: Value) {
        self.platform
            .store
            .store(CONTROLLER, &format!("areas/{name}"), contents)
            .await
            .unwrap();
    }

    pub async fn store_rules(&self, contents: Value) {
        self.platform
            .store
            .store(ALGORITHM, "config", contents)
            .await
            .unwrap();
    }

    pub async fn record(&self, topic: &str, value: impl Into<Value>) {
        self.platform
            .historian
            .record(topic, Sample::new(OffsetDateTime::now_utc(), value))
            .await;
    }

    /// Polls until `check` holds or the deadline passes.
    pub async fn wait_for<F, Fut>(&self, mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);

        while tokio::time::Instant::now() < deadline {
            if check().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        false
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri).method(method);
        let body = match body {
            Some(body) => {
                request = request.header("Content-Type", "application/json");
                Body::from(serde_json::to_string(&body).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    pub async fn stop(self) {
        self.agents.stop().await;
    }
}
