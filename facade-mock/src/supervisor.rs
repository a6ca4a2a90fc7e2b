use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use facade_api::ConfigAction;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

use crate::errors::SimulationError;
use crate::server::ServerConfig;

const STOP_GRACE: Duration = Duration::from_secs(1);

struct RunningServer {
    address: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RunningServer {
    async fn start(name: &str, config: &ServerConfig, router: Router) -> Result<Self, SimulationError> {
        let address = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| SimulationError::Bind {
                address: address.clone(),
                source,
            })?;
        let address = listener
            .local_addr()
            .map_err(|source| SimulationError::Bind { address, source })?;

        let (shutdown, stop) = oneshot::channel::<()>();
        let server_name = name.to_string();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = stop.await;
            });

            if let Err(e) = server.await {
                tracing::error!("Simulation server {} failed: {}", server_name, e);
            }
        });

        tracing::info!("Simulation server {} listening on {}", name, address);

        Ok(Self {
            address,
            shutdown,
            task,
        })
    }

    async fn stop(self) {
        let RunningServer {
            address,
            shutdown,
            mut task,
        } = self;
        let _ = shutdown.send(());

        if tokio::time::timeout(STOP_GRACE, &mut task).await.is_err() {
            tracing::warn!("Simulation server on {} did not drain, aborting", address);
            task.abort();
        }
    }
}

struct ManagedServer {
    config: ServerConfig,
    running: Option<RunningServer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub server_type: String,
    pub endpoint: String,
    pub address: Option<SocketAddr>,
}

/// Owns the simulated device servers; each one can be stopped or replaced
/// without touching the others.
#[derive(Default)]
pub struct ServerSupervisor {
    servers: Mutex<BTreeMap<String, ManagedServer>>,
}

impl ServerSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a `servers/<name>` config change.
    pub async fn apply(&self, name: &str, action: ConfigAction, contents: &Value) -> Result<(), SimulationError> {
        match action {
            ConfigAction::New | ConfigAction::Update => {
                let config = ServerConfig::from_contents(contents)?;
                self.add_server(name, config).await.map(|_| ())
            }
            ConfigAction::Delete => {
                self.remove_server(name).await;
                Ok(())
            }
        }
    }

    /// Starts `name`, replacing a running server of that name.
    ///
    /// An invalid config is rejected before the current server is touched.
    pub async fn add_server(&self, name: &str, config: ServerConfig) -> Result<SocketAddr, SimulationError> {
        let router = config.router()?;
        let mut servers = self.servers.lock().await;

        if let Some(running) = servers.get_mut(name).and_then(|server| server.running.take()) {
            running.stop().await;
        }

        let started = RunningServer::start(name, &config, router).await;
        let (running, result) = match started {
            Ok(running) => {
                let address = running.address;
                (Some(running), Ok(address))
            }
            Err(e) => (None, Err(e)),
        };
        servers.insert(name.to_string(), ManagedServer { config, running });

        result
    }

    /// Stops and forgets `name`.
    pub async fn remove_server(&self, name: &str) -> bool {
        let removed = self.servers.lock().await.remove(name);

        match removed {
            Some(server) => {
                if let Some(running) = server.running {
                    running.stop().await;
                }
                tracing::info!("Simulation server {} removed", name);
                true
            }
            None => false,
        }
    }

    /// Stops `name` but keeps its config for a later reset.
    pub async fn stop_server(&self, name: &str) -> Result<(), SimulationError> {
        let mut servers = self.servers.lock().await;
        let server = servers
            .get_mut(name)
            .ok_or_else(|| SimulationError::ServerNotFound(name.to_string()))?;

        if let Some(running) = server.running.take() {
            running.stop().await;
            tracing::info!("Simulation server {} stopped", name);
        }

        Ok(())
    }

    /// Restarts `name` from its stored config.
    pub async fn reset_server(&self, name: &str) -> Result<SocketAddr, SimulationError> {
        let config = self
            .servers
            .lock()
            .await
            .get(name)
            .map(|server| server.config.clone())
            .ok_or_else(|| SimulationError::ServerNotFound(name.to_string()))?;

        self.add_server(name, config).await
    }

    /// Restarts every known server and returns how many came up.
    pub async fn reset_all_servers(&self) -> usize {
        let mut started = 0;

        for name in self.names().await {
            match self.reset_server(&name).await {
                Ok(_) => started += 1,
                Err(e) => tracing::error!("Error resetting server {}: {}", name, e),
            }
        }

        started
    }

    pub async fn names(&self) -> Vec<String> {
        self.servers.lock().await.keys().cloned().collect()
    }

    pub async fn address(&self, name: &str) -> Option<SocketAddr> {
        self.servers
            .lock()
            .await
            .get(name)
            .and_then(|server| server.running.as_ref())
            .map(|running| running.address)
    }

    pub async fn status(&self) -> Vec<ServerStatus> {
        self.servers
            .lock()
            .await
            .iter()
            .map(|(name, server)| ServerStatus {
                name: name.clone(),
                server_type: server.config.server_type.clone(),
                endpoint: server.config.endpoint.clone(),
                address: server.running.as_ref().map(|running| running.address),
            })
            .collect()
    }

    /// Stops every server.
    pub async fn shutdown(&self) {
        let servers = std::mem::take(&mut *self.servers.lock().await);

        for (name, server) in servers {
            if let Some(running) = server.running {
                running.stop().await;
                tracing::debug!("Simulation server {} shut down", name);
            }
        }
    }
}
