use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use facade_api::ConfigAction;
use serde_json::Value;

use crate::settings::Settings;

pub mod errors;
pub mod server;
pub mod settings;
pub mod supervisor;

pub use errors::SimulationError;
pub use server::{ServerConfig, ServerKind};
pub use supervisor::{ServerStatus, ServerSupervisor};

/// Reads `<name>.json` server documents from `dir`.
pub fn load_server_configs(dir: &Path) -> Result<Vec<(String, Value)>, Box<dyn Error>> {
    let mut configs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(".json"))
        else {
            continue;
        };

        let contents = serde_json::from_str(&fs::read_to_string(&path)?)?;
        configs.push((name.to_string(), contents));
    }

    configs.sort_by(|(left, _), (right, _)| left.cmp(right));

    Ok(configs)
}

pub async fn run(settings: &Arc<Settings>) -> Result<(), Box<dyn Error>> {
    let supervisor = ServerSupervisor::new();

    match settings.servers_dir() {
        Some(dir) if dir.is_dir() => {
            for (name, contents) in load_server_configs(&dir)? {
                if let Err(e) = supervisor.apply(&name, ConfigAction::New, &contents).await {
                    tracing::error!("Error in add_server {}: {}", name, e);
                }
            }
        }
        Some(dir) => tracing::warn!("No server configs in {}", dir.display()),
        None => tracing::warn!("No store path configured"),
    }

    tracing::info!("Running {} simulation servers", supervisor.names().await.len());

    tokio::signal::ctrl_c().await?;

    supervisor.shutdown().await;

    Ok(())
}
