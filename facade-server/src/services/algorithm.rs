use std::sync::Arc;

use facade_analyser::evaluate;
use facade_api::{
    AnalysisRecord, BusMessage, BusPayload, CONTROL_REQUEST_TOPIC, ConfigAction, ConfigEvent,
    ControlRequest, Decision, Rule, analysis_topic, rules_from_config,
};
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;

use crate::errors::RemoteError;
use crate::services::{AgentHandle, ConfigSubscription, EventBus, InputAggregator, RpcRouter};

/// Decision agent: turns control requests into settings for the requesting
/// controller.
pub struct ControlAlgorithm {
    identity: String,
    rules: RwLock<Vec<Rule>>,
    bus: EventBus,
    aggregator: InputAggregator,
    rpc: RpcRouter,
}

impl ControlAlgorithm {
    pub fn new(
        identity: impl Into<String>,
        bus: EventBus,
        aggregator: InputAggregator,
        rpc: RpcRouter,
    ) -> Self {
        Self {
            identity: identity.into(),
            rules: RwLock::new(Vec::new()),
            bus,
            aggregator,
            rpc,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Topic the audit records of this agent are published on.
    pub fn analysis_topic(&self) -> String {
        analysis_topic(&self.identity)
    }

    pub async fn rules(&self) -> Vec<Rule> {
        self.rules.read().await.clone()
    }

    /// Replaces the rule list with the one held by a `config` document.
    ///
    /// Deletions and unreadable documents keep the current rules.
    pub async fn configure(&self, event: &ConfigEvent) {
        tracing::info!("Config {} {} for {}", event.action, event.name, event.identity);

        if event.action == ConfigAction::Delete {
            tracing::info!("Keeping {} rules after delete", self.rules.read().await.len());
            return;
        }

        match rules_from_config(&event.contents) {
            Ok(rules) => {
                tracing::info!("Loaded {} rules", rules.len());
                *self.rules.write().await = rules;
            }
            Err(e) => tracing::error!("Rejected rule config {}: {}", event.name, e),
        }
    }

    /// Aggregates the inputs of the request and evaluates the rules on them.
    pub async fn decide(&self, request: &ControlRequest) -> Decision {
        let inputs = self.aggregator.aggregate(&request.endpoints).await;
        tracing::info!("Input averages for {}: {:?}", request.area, inputs);

        let rules = self.rules.read().await;
        evaluate(&inputs, &rules)
    }

    /// Decides, publishes the audit record and asks `sender` to actuate.
    pub async fn handle_control_request(
        &self,
        sender: &str,
        request: &ControlRequest,
    ) -> Result<Decision, RemoteError> {
        let decision = self.decide(request).await;
        tracing::info!("Calculated states for {}: {:?}", request.area, decision);

        let record = AnalysisRecord::from_decision(request.area.clone(), &decision);
        tracing::info!("Publishing control message: {:?}", record);
        self.bus
            .publish(
                &self.analysis_topic(),
                BusMessage::new(self.identity.clone(), BusPayload::Analysis(record)),
            )
            .await;

        tracing::info!("Calling do_control on {}", sender);
        self.rpc
            .do_control(
                sender,
                &request.area,
                decision.light.value,
                decision.facade_state.value,
            )
            .await?;

        Ok(decision)
    }

    /// Subscribes to control requests and serves them until stopped.
    pub async fn start(self: &Arc<Self>, mut configs: ConfigSubscription) -> AgentHandle {
        let algorithm = self.clone();
        let mut requests = self.bus.subscribe(CONTROL_REQUEST_TOPIC).await;

        AgentHandle::spawn(move |mut stop| async move {
            let mut store_open = true;

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    result = requests.recv() => match result {
                        Ok(BusMessage { header, payload: BusPayload::ControlRequest(request) }) => {
                            if let Err(e) = algorithm.handle_control_request(&header.from, &request).await {
                                tracing::error!("Control of {} failed: {}", request.area, e);
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Control algorithm skipped {} requests", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    event = configs.recv(), if store_open => match event {
                        Some(event) => algorithm.configure(&event).await,
                        None => store_open = false,
                    },
                }
            }

            tracing::info!("Control algorithm {} stopped", algorithm.identity());
        })
    }
}
