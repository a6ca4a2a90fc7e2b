use std::error::Error;
use std::path::PathBuf;
use std::{env, io};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    #[serde(default)]
    pub store: Store,
    pub simulation: Simulation,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let mut settings: Settings = toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))?;

        if let Some(path) = &settings.store.path {
            let normalized_path = Self::normalize_path(path)?.to_string_lossy().to_string();

            settings.store.path = Some(normalized_path);
        }

        Ok(settings)
    }

    /// Directory holding the `servers/*` documents of the simulation identity.
    pub fn servers_dir(&self) -> Option<PathBuf> {
        self.store.path.as_ref().map(|path| {
            PathBuf::from(path)
                .join(&self.simulation.identity)
                .join("servers")
        })
    }

    fn normalize_path(path: &str) -> io::Result<PathBuf> {
        let path_buf = PathBuf::from(path);

        Ok(if path_buf.is_absolute() {
            path_buf.clone()
        } else {
            env::current_dir()?.as_path().join(&path_buf)
        })
    }
}
