use std::collections::HashMap;
use std::sync::Arc;

use facade_api::BusMessage;
use tokio::sync::{RwLock, broadcast};

const CHANNEL_CAPACITY: usize = 100;

/// Topic-keyed publish/subscribe bus shared by the agents of one process.
#[derive(Clone, Default)]
pub struct EventBus {
    publishers: Arc<RwLock<HashMap<String, broadcast::Sender<BusMessage>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        if let Some(sender) = self.publishers.read().await.get(topic) {
            return sender.clone();
        }

        let mut publishers = self.publishers.write().await;
        publishers
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Publishes to every current subscriber of `topic` and returns how many
    /// received the message.
    pub async fn publish(&self, topic: &str, message: BusMessage) -> usize {
        match self.sender(topic).await.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("No subscribers on {}", topic);
                0
            }
        }
    }

    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<BusMessage> {
        self.sender(topic).await.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use facade_api::{AnalysisRecord, BusPayload, Decision};

    use super::*;

    fn analysis(area: &str) -> BusMessage {
        BusMessage::new(
            "test.agent",
            BusPayload::Analysis(AnalysisRecord::from_decision(area, &Decision::default())),
        )
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let event_bus = EventBus::new();

        let mut receiver1 = event_bus.subscribe("test/topic").await;
        let mut receiver2 = event_bus.subscribe("test/topic").await;

        let receiver_count = event_bus.publish("test/topic", analysis("A")).await;
        assert_eq!(receiver_count, 2);

        for receiver in [&mut receiver1, &mut receiver2] {
            let message = receiver.recv().await.unwrap();
            assert_eq!(message.header.from, "test.agent");
            assert!(matches!(message.payload, BusPayload::Analysis(ref record) if record.area == "A"));
        }
    }

    #[tokio::test]
    async fn test_multiple_topics() {
        let event_bus = EventBus::new();

        let mut receiver1 = event_bus.subscribe("topic1").await;
        let mut receiver2 = event_bus.subscribe("topic2").await;

        event_bus.publish("topic1", analysis("one")).await;
        event_bus.publish("topic2", analysis("two")).await;

        assert!(matches!(
            receiver1.recv().await.unwrap().payload,
            BusPayload::Analysis(ref record) if record.area == "one"
        ));
        assert!(matches!(
            receiver2.recv().await.unwrap().payload,
            BusPayload::Analysis(ref record) if record.area == "two"
        ));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let event_bus = EventBus::new();

        assert_eq!(event_bus.publish("nobody/listens", analysis("A")).await, 0);
    }
}
