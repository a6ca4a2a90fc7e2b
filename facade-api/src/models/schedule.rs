use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const SCHEDULE_SUCCESS: &str = "SUCCESS";
pub const SCHEDULE_FAILURE: &str = "FAILURE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulePriority {
    #[default]
    High,
    Low,
    LowPreempt,
}

/// Exclusive write window requested for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Endpoint to reserve
    pub endpoint: String,
    /// Window start
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    /// Window end
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

/// Answer of the scheduling service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// `SUCCESS` or a failure marker
    pub result: String,
    /// Additional detail on failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl ScheduleResult {
    pub fn success() -> Self {
        Self {
            result: SCHEDULE_SUCCESS.to_string(),
            info: None,
        }
    }

    pub fn failure(info: impl Into<String>) -> Self {
        Self {
            result: SCHEDULE_FAILURE.to_string(),
            info: Some(info.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == SCHEDULE_SUCCESS
    }
}
