use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::models::{AreaEndpoints, Decision};

/// Topic the controller publishes control requests on.
pub const CONTROL_REQUEST_TOPIC: &str = "agent/ofc_generic_control_algorithm";

/// Prefix of audit record topics; the algorithm identity is appended.
pub const ANALYSIS_TOPIC_PREFIX: &str = "analysis/ofc_analysis";

pub fn analysis_topic(identity: &str) -> String {
    format!("{ANALYSIS_TOPIC_PREFIX}/{identity}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Identity of the publishing agent
    pub from: String,
    /// Publication time
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl MessageHeader {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            date: OffsetDateTime::now_utc(),
        }
    }
}

/// Asks the control algorithm to decide the outputs of one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRequest {
    /// Area name
    pub area: String,
    /// Every endpoint of the area, per category
    pub endpoints: AreaEndpoints,
    /// Options carried through from the area config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_options: Option<Value>,
}

/// Audit record of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Area name
    pub area: String,
    /// Summary of the settings sent to the area
    pub action: String,
    /// Justification of each setting
    pub reason: String,
}

impl AnalysisRecord {
    pub fn from_decision(area: impl Into<String>, decision: &Decision) -> Self {
        Self {
            area: area.into(),
            action: format!(
                "Set light level: {}, Façade state: {}",
                decision.light.value, decision.facade_state.value
            ),
            reason: format!(
                "Light level reason: {}, Façade state reason: {}",
                decision.light.reason, decision.facade_state.reason
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BusPayload {
    ControlRequest(ControlRequest),
    Analysis(AnalysisRecord),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub header: MessageHeader,
    pub payload: BusPayload,
}

impl BusMessage {
    pub fn new(from: impl Into<String>, payload: BusPayload) -> Self {
        Self {
            header: MessageHeader::new(from),
            payload,
        }
    }
}
