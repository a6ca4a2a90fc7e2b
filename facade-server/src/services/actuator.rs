use std::collections::HashMap;
use std::slice;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use facade_api::{Sample, SchedulePriority, ScheduleRequest, ScheduleResult};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::errors::RemoteError;
use crate::services::{MemoryHistorian, bounded};

const ACTUATOR: &str = "platform.actuator";

/// Shared actuation substrate: write leases plus set points.
#[async_trait]
pub trait ActuatorPlatform: Send + Sync {
    async fn request_new_schedule(
        &self,
        requester: &str,
        task: &str,
        priority: SchedulePriority,
        requests: &[ScheduleRequest],
    ) -> Result<ScheduleResult, RemoteError>;

    async fn set_point(&self, requester: &str, endpoint: &str, value: f64) -> Result<Value, RemoteError>;
}

#[derive(Debug, Clone)]
struct Lease {
    requester: String,
    task: String,
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl Lease {
    fn is_active(&self, at: OffsetDateTime) -> bool {
        self.start <= at && at < self.end
    }

    fn overlaps(&self, request: &ScheduleRequest) -> bool {
        self.start < request.end && request.start < self.end
    }
}

/// In-process actuator holding point values and a lease table.
#[derive(Default)]
pub struct LocalActuator {
    leases: RwLock<HashMap<String, Lease>>,
    points: RwLock<HashMap<String, f64>>,
    historian: Option<Arc<MemoryHistorian>>,
}

impl LocalActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors every accepted write into `historian` under the endpoint topic.
    pub fn with_historian(historian: Arc<MemoryHistorian>) -> Self {
        Self {
            historian: Some(historian),
            ..Self::default()
        }
    }

    pub async fn get_point(&self, endpoint: &str) -> Option<f64> {
        self.points.read().await.get(endpoint).copied()
    }
}

#[async_trait]
impl ActuatorPlatform for LocalActuator {
    async fn request_new_schedule(
        &self,
        requester: &str,
        task: &str,
        priority: SchedulePriority,
        requests: &[ScheduleRequest],
    ) -> Result<ScheduleResult, RemoteError> {
        let mut leases = self.leases.write().await;
        let now = OffsetDateTime::now_utc();

        leases.retain(|_, lease| lease.end > now);

        for request in requests {
            if request.end <= request.start {
                return Ok(ScheduleResult::failure("MALFORMED_REQUEST"));
            }

            let conflict = leases
                .get(&request.endpoint)
                .filter(|lease| lease.requester != requester && lease.overlaps(request));
            if let Some(lease) = conflict {
                tracing::debug!(
                    "Lease on {} held by {} for {}",
                    request.endpoint,
                    lease.requester,
                    lease.task
                );
                return Ok(ScheduleResult::failure("CONFLICTS_WITH_EXISTING_SCHEDULES"));
            }
        }

        for request in requests {
            leases.insert(
                request.endpoint.clone(),
                Lease {
                    requester: requester.to_string(),
                    task: task.to_string(),
                    start: request.start,
                    end: request.end,
                },
            );
        }

        tracing::debug!("Granted {:?} schedule {} to {}", priority, task, requester);

        Ok(ScheduleResult::success())
    }

    async fn set_point(&self, requester: &str, endpoint: &str, value: f64) -> Result<Value, RemoteError> {
        let now = OffsetDateTime::now_utc();

        if let Some(lease) = self.leases.read().await.get(endpoint) {
            if lease.requester != requester && lease.is_active(now) {
                return Err(RemoteError::Rejected(
                    ACTUATOR.to_string(),
                    format!("{endpoint} is leased by {}", lease.requester),
                ));
            }
        }

        self.points.write().await.insert(endpoint.to_string(), value);

        if let Some(historian) = &self.historian {
            historian.record(endpoint, Sample::new(now, value)).await;
        }

        Ok(json!(value))
    }
}

/// Lease-then-write protocol used by a controller to actuate endpoints.
#[derive(Clone)]
pub struct ActuatorClient {
    platform: Arc<dyn ActuatorPlatform>,
    requester: String,
    timeout: Duration,
    lease: Duration,
}

impl ActuatorClient {
    pub fn new(
        platform: Arc<dyn ActuatorPlatform>,
        requester: impl Into<String>,
        timeout: Duration,
        lease: Duration,
    ) -> Self {
        Self {
            platform,
            requester: requester.into(),
            timeout,
            lease,
        }
    }

    /// Requests a lease on `endpoint`, then writes `value`.
    ///
    /// The write is issued whatever the outcome of the lease request.
    pub async fn schedule_and_actuate(&self, endpoint: &str, value: f64) -> Result<Value, RemoteError> {
        let now = OffsetDateTime::now_utc();
        let task = format!("{now}: {endpoint} {value}");
        let request = ScheduleRequest {
            endpoint: endpoint.to_string(),
            start: now,
            end: now + self.lease,
        };

        tracing::info!("Scheduling actuation for: {}", endpoint);

        let schedule = self.platform.request_new_schedule(
            &self.requester,
            &task,
            SchedulePriority::High,
            slice::from_ref(&request),
        );
        match bounded("request_new_schedule", self.timeout, schedule).await {
            Ok(result) if result.is_success() => {
                tracing::info!("Schedule result for {}: {}", endpoint, result.result)
            }
            Ok(result) => tracing::warn!(
                "Schedule for {} was not successful: {} {}",
                endpoint,
                result.result,
                result.info.unwrap_or_default()
            ),
            Err(e) => tracing::error!("Error scheduling actuation for {}: {}", endpoint, e),
        }

        let set_point = self.platform.set_point(&self.requester, endpoint, value);
        let result = bounded("set_point", self.timeout, set_point).await?;

        tracing::info!("Set point result for {}: {}", endpoint, result);

        Ok(result)
    }

    /// Actuates every endpoint in order and returns how many writes succeeded.
    pub async fn actuate_all(&self, endpoints: &[String], value: f64) -> usize {
        let mut written = 0;

        for endpoint in endpoints {
            match self.schedule_and_actuate(endpoint, value).await {
                Ok(_) => written += 1,
                Err(e) => tracing::error!("Error actuating endpoint {}: {}", endpoint, e),
            }
        }

        written
    }
}
