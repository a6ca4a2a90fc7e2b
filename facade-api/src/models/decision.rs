use serde::{Deserialize, Serialize};

use super::ControlOutput;

pub const DEFAULT_REASON: &str = "Default";
pub const DEFAULT_LIGHT_LEVEL: f64 = 0.1;
pub const DEFAULT_FACADE_STATE: f64 = 0.0;

/// Value chosen for one output and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputState {
    /// Setting to actuate
    pub value: f64,
    /// Human-readable justification
    pub reason: String,
}

impl OutputState {
    pub fn new(value: f64, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: reason.into(),
        }
    }
}

/// Result of evaluating the rule list against one input snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "Light")]
    pub light: OutputState,
    #[serde(rename = "Façade State")]
    pub facade_state: OutputState,
}

impl Default for Decision {
    fn default() -> Self {
        Self {
            light: OutputState::new(DEFAULT_LIGHT_LEVEL, DEFAULT_REASON),
            facade_state: OutputState::new(DEFAULT_FACADE_STATE, DEFAULT_REASON),
        }
    }
}

impl Decision {
    pub fn output_mut(&mut self, output: ControlOutput) -> &mut OutputState {
        match output {
            ControlOutput::Light => &mut self.light,
            ControlOutput::FacadeState => &mut self.facade_state,
        }
    }
}
