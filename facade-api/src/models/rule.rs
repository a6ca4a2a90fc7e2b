use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ControlOutput, DeviceCategory};

/// Input named by a condition. Names outside the known categories are kept
/// so the rest of the rule still loads; such conditions never block a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionInput {
    Category(DeviceCategory),
    Other(String),
}

impl ConditionInput {
    pub fn category(&self) -> Option<DeviceCategory> {
        match self {
            ConditionInput::Category(category) => Some(*category),
            ConditionInput::Other(_) => None,
        }
    }
}

impl From<DeviceCategory> for ConditionInput {
    fn from(category: DeviceCategory) -> Self {
        ConditionInput::Category(category)
    }
}

impl From<String> for ConditionInput {
    fn from(name: String) -> Self {
        match name.parse() {
            Ok(category) => ConditionInput::Category(category),
            Err(_) => ConditionInput::Other(name),
        }
    }
}

impl From<ConditionInput> for String {
    fn from(input: ConditionInput) -> Self {
        match input {
            ConditionInput::Category(category) => category.as_str().to_string(),
            ConditionInput::Other(name) => name,
        }
    }
}

/// Input condition: holds when the aggregated value reaches the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Input to check
    #[serde(rename = "Type")]
    pub category: ConditionInput,
    /// Inclusive lower bound
    #[serde(rename = "Threshold")]
    pub threshold: f64,
}

/// Output setting applied when every condition of the rule holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Output to drive
    #[serde(rename = "Type")]
    pub output: ControlOutput,
    /// Value to set
    #[serde(rename = "Setting")]
    pub setting: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Conditions, all of which must hold
    #[serde(rename = "Inputs", default)]
    pub inputs: Vec<Condition>,
    /// Settings applied on a match
    #[serde(rename = "Outputs", default)]
    pub outputs: Vec<Action>,
}

impl Condition {
    pub fn new(category: impl Into<ConditionInput>, threshold: f64) -> Self {
        Self {
            category: category.into(),
            threshold,
        }
    }
}

impl Rule {
    pub fn new(inputs: Vec<Condition>, outputs: Vec<Action>) -> Self {
        Self { inputs, outputs }
    }
}

/// Reads the rule list out of a control algorithm config document.
///
/// Accepts a bare list of rules or an object holding them under
/// `algorithm_params`.
pub fn rules_from_config(contents: &Value) -> Result<Vec<Rule>, serde_json::Error> {
    match contents.get("algorithm_params") {
        Some(params) => Vec::<Rule>::deserialize(params),
        None => Vec::<Rule>::deserialize(contents),
    }
}
