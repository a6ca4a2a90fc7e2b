mod actuator;
mod agent;
mod aggregator;
mod algorithm;
mod area_registry;
mod config_store;
mod controller;
mod event_bus;
mod historian;
mod rpc;

pub use actuator::*;
pub use agent::*;
pub use aggregator::*;
pub use algorithm::*;
pub use area_registry::*;
pub use config_store::*;
pub use controller::*;
pub use event_bus::*;
pub use historian::*;
pub use rpc::*;
