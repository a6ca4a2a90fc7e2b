mod bus;
mod config;

pub use bus::*;
pub use config::*;
