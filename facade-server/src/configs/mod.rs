pub mod settings;

pub use settings::{Control, Logger, Server, Settings, Simulation, Store};
