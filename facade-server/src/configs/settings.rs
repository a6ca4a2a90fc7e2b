use std::env;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Control {
    pub identity: String,
    pub algorithm_identity: String,
    pub period_secs: u64,
    pub sample_count: usize,
    pub summary_sample_count: usize,
    pub historian_timeout_secs: u64,
    pub actuator_timeout_secs: u64,
    pub lease_secs: u64,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            identity: "ofc.area_controller".to_string(),
            algorithm_identity: "ofc.control_algorithm".to_string(),
            period_secs: 10,
            sample_count: 10,
            summary_sample_count: 20,
            historian_timeout_secs: 10,
            actuator_timeout_secs: 4,
            lease_secs: 10,
        }
    }
}

impl Control {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs.max(1))
    }

    pub fn historian_timeout(&self) -> Duration {
        Duration::from_secs(self.historian_timeout_secs)
    }

    pub fn actuator_timeout(&self) -> Duration {
        Duration::from_secs(self.actuator_timeout_secs)
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    /// Directory seeding the config store, laid out as `<identity>/<name>.json`
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Simulation {
    pub enabled: bool,
    pub identity: String,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            enabled: false,
            identity: "ofc.simulation_server_manager".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    #[serde(default)]
    pub control: Control,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub simulation: Simulation,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Self::from_sources(
            Path::new("configs"),
            &run_mode,
            Environment::default().separator("__").try_parsing(true),
        )
    }

    /// Layers `<dir>/default`, the optional `<dir>/<run_mode>` file and the
    /// environment, later sources overriding single keys of earlier ones.
    pub fn from_sources(dir: &Path, run_mode: &str, environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(&dir.join("default").to_string_lossy()))
            .add_source(File::with_name(&dir.join(run_mode).to_string_lossy()).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}
