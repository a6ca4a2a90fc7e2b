use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A single historian reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Time the reading was taken
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Raw reading, possibly null or non-numeric
    pub value: Value,
}

impl Sample {
    pub fn new(timestamp: OffsetDateTime, value: impl Into<Value>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }

    /// Numeric reading, if the sample carries one. Boolean sensors read as
    /// `1.0` and `0.0`.
    pub fn numeric(&self) -> Option<f64> {
        match &self.value {
            Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            value => value.as_f64(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryOrder {
    FirstToLast,
    #[default]
    LastToFirst,
}

/// One row of the merged action/reason history of an analysis topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisHistoryEntry {
    /// Time the analysis was published
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Action recorded at that time, if any
    pub action: Option<Value>,
    /// Reason recorded at that time, if any
    pub reason: Option<Value>,
}
