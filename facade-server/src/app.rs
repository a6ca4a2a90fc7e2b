use std::path::Path;
use std::sync::Arc;

use axum::Router;
use facade_api::ConfigPattern;
use facade_mock::ServerSupervisor;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{Control, Settings, Simulation};
use crate::errors::StoreError;
use crate::handles::*;
use crate::services::{
    AREA_PATTERN, ActuatorClient, AgentHandle, AreaController, CONFIG_PATTERN, ConfigStore,
    ConfigSubscription, ControlAlgorithm, EventBus, HistorianRecorder, InputAggregator,
    LocalActuator, MemoryHistorian, RpcRouter,
};

pub const SERVER_PATTERN: &str = "servers/*";

/// Shared services every agent of the process talks to.
#[derive(Clone)]
pub struct Platform {
    pub bus: EventBus,
    pub historian: Arc<MemoryHistorian>,
    pub actuator: Arc<LocalActuator>,
    pub store: Arc<ConfigStore>,
    pub rpc: RpcRouter,
}

impl Platform {
    pub fn new(store: ConfigStore) -> Self {
        let historian = Arc::new(MemoryHistorian::default());

        Self {
            bus: EventBus::new(),
            actuator: Arc::new(LocalActuator::with_historian(historian.clone())),
            historian,
            store: Arc::new(store),
            rpc: RpcRouter::new(),
        }
    }

    /// Builds the platform, seeding the config store from the store directory
    /// when one is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self, StoreError> {
        let store = match settings.store.path.as_deref().map(Path::new) {
            Some(path) if path.is_dir() => {
                tracing::info!("Loading config store from {}", path.display());
                ConfigStore::load_dir(path)?
            }
            Some(path) => {
                tracing::warn!("Config store {} not found, starting empty", path.display());
                ConfigStore::new()
            }
            None => ConfigStore::new(),
        };

        Ok(Self::new(store))
    }
}

/// Running agents of the process.
pub struct Agents {
    pub controller: Arc<AreaController>,
    pub algorithm: Arc<ControlAlgorithm>,
    pub supervisor: Option<Arc<ServerSupervisor>>,
    rpc: RpcRouter,
    handles: Vec<AgentHandle>,
}

impl Agents {
    pub async fn start(control: &Control, simulation: &Simulation, platform: &Platform) -> Self {
        let mut handles = Vec::new();

        let actuator = ActuatorClient::new(
            platform.actuator.clone(),
            control.identity.clone(),
            control.actuator_timeout(),
            control.lease(),
        );
        let controller = Arc::new(AreaController::new(
            control.clone(),
            platform.bus.clone(),
            platform.historian.clone(),
            actuator,
        ));
        platform
            .rpc
            .register(control.identity.clone(), controller.clone())
            .await;

        let aggregator = InputAggregator::new(
            platform.historian.clone(),
            control.sample_count,
            control.historian_timeout(),
        );
        let algorithm = Arc::new(ControlAlgorithm::new(
            control.algorithm_identity.clone(),
            platform.bus.clone(),
            aggregator,
            platform.rpc.clone(),
        ));

        let recorder = HistorianRecorder::new(
            platform.bus.clone(),
            platform.historian.clone(),
            algorithm.analysis_topic(),
        );
        handles.push(recorder.start().await);

        let algorithm_configs = platform
            .store
            .subscribe(algorithm.identity(), &[CONFIG_PATTERN])
            .await;
        handles.push(algorithm.start(algorithm_configs).await);

        let controller_configs = platform
            .store
            .subscribe(controller.identity(), &[AREA_PATTERN, CONFIG_PATTERN])
            .await;
        handles.push(controller.start(controller_configs));

        let supervisor = if simulation.enabled {
            let supervisor = Arc::new(ServerSupervisor::new());
            let configs = platform
                .store
                .subscribe(&simulation.identity, &[SERVER_PATTERN])
                .await;
            handles.push(start_simulation(supervisor.clone(), configs));
            Some(supervisor)
        } else {
            None
        };

        tracing::info!(
            "Agents started: {}, {}",
            controller.identity(),
            algorithm.identity()
        );

        Self {
            controller,
            algorithm,
            supervisor,
            rpc: platform.rpc.clone(),
            handles,
        }
    }

    pub async fn stop(self) {
        self.rpc.unregister(self.controller.identity()).await;

        for handle in self.handles.into_iter().rev() {
            handle.stop().await;
        }

        if let Some(supervisor) = self.supervisor {
            supervisor.shutdown().await;
        }

        tracing::info!("Agents stopped");
    }
}

/// Feeds `servers/*` config changes into the supervisor.
fn start_simulation(supervisor: Arc<ServerSupervisor>, mut configs: ConfigSubscription) -> AgentHandle {
    AgentHandle::spawn(move |mut stop| async move {
        let servers = ConfigPattern::parse(SERVER_PATTERN);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                event = configs.recv() => match event {
                    Some(event) => {
                        let name = servers.strip(&event.name);
                        if let Err(e) = supervisor.apply(name, event.action, &event.contents).await {
                            tracing::error!("Error applying simulation server {}: {}", name, e);
                        }
                    }
                    None => break,
                },
            }
        }
    })
}

pub fn create_router(control: &Control, platform: &Platform, agents: &Agents) -> Router {
    let mut router = Router::new()
        .merge(area_router(AreaState {
            controller: agents.controller.clone(),
        }))
        .merge(topic_router(TopicState {
            historian: platform.historian.clone(),
            sample_count: control.summary_sample_count,
            timeout: control.historian_timeout(),
        }))
        .merge(store_router(StoreState {
            store: platform.store.clone(),
        }));

    if let Some(supervisor) = &agents.supervisor {
        router = router.merge(simulation_router(SimulationState {
            supervisor: supervisor.clone(),
        }));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub struct App {
    pub platform: Platform,
    pub agents: Agents,
    pub router: Router,
}

pub async fn create_app(settings: &Settings) -> anyhow::Result<App> {
    let platform = Platform::from_settings(settings)?;
    let agents = Agents::start(&settings.control, &settings.simulation, &platform).await;
    let router = create_router(&settings.control, &platform, &agents);

    Ok(App {
        platform,
        agents,
        router,
    })
}
