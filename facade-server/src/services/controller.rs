use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use facade_api::{
    AreaConfig, AreaSummary, BusMessage, BusPayload, CONTROL_REQUEST_TOPIC, ConfigEvent, ConfigPattern,
    ControlRequest, DeviceCategory, EndpointSummary,
};
use tokio::time::{Instant, MissedTickBehavior};

use crate::configs::Control;
use crate::errors::{AreaError, RemoteError};
use crate::services::{
    ActuatorClient, AgentHandle, AreaControl, AreaRegistry, ConfigSubscription, EventBus, Historian,
    fetch_series,
};

pub const AREA_PATTERN: &str = "areas/*";
pub const CONFIG_PATTERN: &str = "config";

/// Owns the areas of one controller and drives their periodic control.
pub struct AreaController {
    control: Control,
    registry: AreaRegistry,
    bus: EventBus,
    historian: Arc<dyn Historian>,
    actuator: ActuatorClient,
}

impl AreaController {
    pub fn new(
        control: Control,
        bus: EventBus,
        historian: Arc<dyn Historian>,
        actuator: ActuatorClient,
    ) -> Self {
        Self {
            control,
            registry: AreaRegistry::new(),
            bus,
            historian,
            actuator,
        }
    }

    pub fn identity(&self) -> &str {
        &self.control.identity
    }

    pub fn registry(&self) -> &AreaRegistry {
        &self.registry
    }

    /// Applies a config event of this controller.
    ///
    /// `areas/<name>` documents update the registry; invalid ones are logged
    /// and leave the previous area in place.
    pub async fn handle_config(&self, event: &ConfigEvent) {
        tracing::info!("Config {} {} for {}", event.action, event.name, event.identity);

        let areas = ConfigPattern::parse(AREA_PATTERN);
        if !areas.matches(&event.name) {
            tracing::debug!("Controller config: {}", event.contents);
            return;
        }

        let name = areas.strip(&event.name);
        match self.registry.apply(name, event.action, &event.contents).await {
            Ok(()) => tracing::info!("Area {} {}", name, event.action),
            Err(e) => tracing::error!("Error applying area {}: {}", name, e),
        }
    }

    /// Publishes one control request per known area and returns how many
    /// were sent.
    pub async fn publish_control_requests(&self) -> usize {
        let areas = self.registry.snapshot().await;

        for (area, config) in &areas {
            let request = ControlRequest {
                area: area.clone(),
                endpoints: config.endpoints.clone(),
                control_options: config.control_options.clone(),
            };
            tracing::info!("Publishing control message for area {}", area);
            tracing::debug!("Control request: {:?}", request);

            let message = BusMessage::new(self.identity(), BusPayload::ControlRequest(request));
            self.bus.publish(CONTROL_REQUEST_TOPIC, message).await;
        }

        areas.len()
    }

    async fn summarize(&self, config: &AreaConfig) -> AreaSummary {
        let mut endpoints = BTreeMap::new();

        for (category, topics) in config.endpoints.iter() {
            let mut summaries = Vec::with_capacity(topics.len());
            for endpoint in topics {
                summaries.push(EndpointSummary {
                    endpoint: endpoint.clone(),
                    values: fetch_series(
                        self.historian.as_ref(),
                        endpoint,
                        self.control.summary_sample_count,
                        self.control.historian_timeout(),
                    )
                    .await,
                });
            }
            endpoints.insert(category, summaries);
        }

        AreaSummary {
            endpoints,
            control_options: config.control_options.clone(),
        }
    }

    /// Area config enriched with the latest samples of every endpoint.
    pub async fn get_summary(&self, area: &str) -> Result<AreaSummary, AreaError> {
        let config = self
            .registry
            .get(area)
            .await
            .ok_or_else(|| AreaError::AreaNotFound(area.to_string()))?;

        Ok(self.summarize(&config).await)
    }

    pub async fn get_summaries(&self) -> BTreeMap<String, AreaSummary> {
        let mut summaries = BTreeMap::new();

        for (area, config) in self.registry.snapshot().await {
            let summary = self.summarize(&config).await;
            summaries.insert(area, summary);
        }

        summaries
    }

    /// Runs the control loop: applies config events as they arrive and
    /// publishes control requests every period.
    pub fn start(self: &Arc<Self>, mut configs: ConfigSubscription) -> AgentHandle {
        let controller = self.clone();

        AgentHandle::spawn(move |mut stop| async move {
            let period = controller.control.period();
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut store_open = true;

            tracing::info!("Controller {} started with period {:?}", controller.identity(), period);

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        let published = controller.publish_control_requests().await;
                        tracing::debug!("Control tick published {} requests", published);
                    },
                    event = configs.recv(), if store_open => match event {
                        Some(event) => controller.handle_config(&event).await,
                        None => {
                            tracing::warn!("Config store closed for {}", controller.identity());
                            store_open = false;
                        }
                    },
                }
            }

            tracing::info!("Controller {} stopped", controller.identity());
        })
    }
}

#[async_trait]
impl AreaControl for AreaController {
    async fn do_control(
        &self,
        area: &str,
        light_level: f64,
        facade_state: f64,
    ) -> Result<(), RemoteError> {
        tracing::info!(
            "do_control area: {}, light_level: {}, facade_state: {}",
            area,
            light_level,
            facade_state
        );

        let Some(config) = self.registry.get(area).await else {
            tracing::error!("Area {} not found in areas: {:?}", area, self.registry.names().await);
            return Ok(());
        };

        for (output, value) in [
            (DeviceCategory::Light, light_level),
            (DeviceCategory::FacadeState, facade_state),
        ] {
            let endpoints = config.endpoints.get(output);
            let written = self.actuator.actuate_all(endpoints, value).await;
            if written < endpoints.len() {
                tracing::warn!(
                    "Area {}: {} of {} {} endpoints written",
                    area,
                    written,
                    endpoints.len(),
                    output
                );
            }
        }

        tracing::info!("Finished do_control for {}", area);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use facade_api::ConfigAction;
    use serde_json::json;

    use super::*;
    use crate::services::{LocalActuator, MemoryHistorian};

    fn controller() -> (AreaController, EventBus, Arc<LocalActuator>) {
        let bus = EventBus::new();
        let historian = Arc::new(MemoryHistorian::default());
        let actuator = Arc::new(LocalActuator::with_historian(historian.clone()));
        let control = Control::default();
        let client = ActuatorClient::new(
            actuator.clone(),
            control.identity.clone(),
            Duration::from_secs(1),
            control.lease(),
        );

        (
            AreaController::new(control, bus.clone(), historian, client),
            bus,
            actuator,
        )
    }

    fn area_event(name: &str, action: ConfigAction, devices: serde_json::Value) -> ConfigEvent {
        ConfigEvent {
            identity: "ofc.area_controller".to_string(),
            name: name.to_string(),
            action,
            contents: json!({"Devices": devices}),
        }
    }

    #[tokio::test]
    async fn test_area_events_strip_prefix() {
        let (controller, _, _) = controller();

        controller
            .handle_config(&area_event(
                "areas/east",
                ConfigAction::New,
                json!([{"Type": "Light", "VOLTTRON Endpoint": "L1"}]),
            ))
            .await;
        controller
            .handle_config(&area_event("config", ConfigAction::New, json!([])))
            .await;

        assert_eq!(controller.registry().names().await, ["east"]);
    }

    #[tokio::test]
    async fn test_publishes_one_request_per_area() {
        let (controller, bus, _) = controller();
        let mut receiver = bus.subscribe(CONTROL_REQUEST_TOPIC).await;
        for name in ["areas/a", "areas/b"] {
            controller
                .handle_config(&area_event(name, ConfigAction::New, json!([])))
                .await;
        }

        assert_eq!(controller.publish_control_requests().await, 2);

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.header.from, "ofc.area_controller");
        let BusPayload::ControlRequest(request) = first.payload else {
            panic!("expected a control request");
        };
        assert_eq!(request.area, "a");
        assert!(request.endpoints.is_empty());
    }

    #[tokio::test]
    async fn test_do_control_writes_every_output_endpoint() {
        let (controller, _, actuator) = controller();
        controller
            .handle_config(&area_event(
                "areas/A",
                ConfigAction::New,
                json!([
                    {"Type": "Light", "VOLTTRON Endpoint": "L1"},
                    {"Type": "Light", "VOLTTRON Endpoint": "L2"},
                    {"Type": "Façade State", "VOLTTRON Endpoint": "F1"},
                    {"Type": "Illuminance", "VOLTTRON Endpoint": "I1"}
                ]),
            ))
            .await;

        controller.do_control("A", 0.5, 2.0).await.unwrap();

        assert_eq!(actuator.get_point("L1").await, Some(0.5));
        assert_eq!(actuator.get_point("L2").await, Some(0.5));
        assert_eq!(actuator.get_point("F1").await, Some(2.0));
        assert_eq!(actuator.get_point("I1").await, None);
    }

    #[tokio::test]
    async fn test_do_control_unknown_area() {
        let (controller, _, actuator) = controller();

        assert!(controller.do_control("missing", 0.5, 2.0).await.is_ok());
        assert_eq!(actuator.get_point("L1").await, None);
    }

    #[tokio::test]
    async fn test_summary_of_unknown_area() {
        let (controller, _, _) = controller();

        assert!(matches!(
            controller.get_summary("missing").await,
            Err(AreaError::AreaNotFound(_))
        ));
    }
}
