use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use facade_api::{BusPayload, QueryOrder, Sample};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;

use crate::errors::RemoteError;
use crate::services::{AgentHandle, EventBus};

/// Time-series store queried by topic.
#[async_trait]
pub trait Historian: Send + Sync {
    /// Up to `count` samples of `topic`, ordered by `order`.
    async fn query(
        &self,
        topic: &str,
        count: usize,
        order: QueryOrder,
    ) -> Result<Vec<Sample>, RemoteError>;

    /// Every topic holding data.
    async fn topic_list(&self) -> Result<Vec<String>, RemoteError>;
}

/// In-process historian keeping the latest samples of every topic.
pub struct MemoryHistorian {
    series: RwLock<BTreeMap<String, VecDeque<Sample>>>,
    capacity: usize,
}

impl MemoryHistorian {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            series: RwLock::new(BTreeMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Appends a sample, evicting the oldest one once the topic is full.
    pub async fn record(&self, topic: &str, sample: Sample) {
        let mut series = self.series.write().await;
        let samples = series.entry(topic.to_string()).or_default();

        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }
}

impl Default for MemoryHistorian {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Historian for MemoryHistorian {
    async fn query(
        &self,
        topic: &str,
        count: usize,
        order: QueryOrder,
    ) -> Result<Vec<Sample>, RemoteError> {
        let series = self.series.read().await;
        let Some(samples) = series.get(topic) else {
            return Ok(Vec::new());
        };

        Ok(match order {
            QueryOrder::FirstToLast => samples.iter().take(count).cloned().collect(),
            QueryOrder::LastToFirst => samples.iter().rev().take(count).cloned().collect(),
        })
    }

    async fn topic_list(&self) -> Result<Vec<String>, RemoteError> {
        Ok(self.series.read().await.keys().cloned().collect())
    }
}

/// Stores audit records published on the bus, one historian topic per field.
pub struct HistorianRecorder {
    bus: EventBus,
    historian: Arc<MemoryHistorian>,
    topic: String,
}

impl HistorianRecorder {
    pub fn new(bus: EventBus, historian: Arc<MemoryHistorian>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            historian,
            topic: topic.into(),
        }
    }

    /// Subscribes before returning, so nothing published afterwards is missed.
    pub async fn start(self) -> AgentHandle {
        let mut receiver = self.bus.subscribe(&self.topic).await;
        let base = self
            .topic
            .strip_prefix("analysis/")
            .unwrap_or(&self.topic)
            .to_string();

        AgentHandle::spawn(move |mut stop| async move {
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    result = receiver.recv() => match result {
                        Ok(message) => {
                            let BusPayload::Analysis(record) = message.payload else {
                                continue;
                            };
                            let timestamp = message.header.date;

                            for (field, value) in [
                                ("area", record.area),
                                ("action", record.action),
                                ("reason", record.reason),
                            ] {
                                self.historian
                                    .record(&format!("{base}/{field}"), Sample::new(timestamp, Value::String(value)))
                                    .await;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Historian recorder skipped {} messages", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        })
    }
}
