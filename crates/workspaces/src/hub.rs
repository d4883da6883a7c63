//! Per-workspace broadcast channels for realtime subscribers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::types::EventEnvelope;

const CHANNEL_CAPACITY: usize = 100;

/// Fan-out point between the services that mutate a workspace and the
/// sockets watching it.
#[derive(Clone, Default)]
pub struct EventHub {
    workspaces: Arc<RwLock<HashMap<String, broadcast::Sender<Arc<EventEnvelope>>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the broadcaster for a workspace and subscribe to it.
    pub async fn subscribe(&self, workspace_id: &str) -> broadcast::Receiver<Arc<EventEnvelope>> {
        let mut workspaces = self.workspaces.write().await;
        workspaces
            .entry(workspace_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver an event to current subscribers. Nobody listening is fine.
    pub async fn publish(&self, envelope: EventEnvelope) {
        let event_type = envelope.event.event_type_name();
        let workspace_id = envelope.workspace_id.clone();

        let sender = {
            let workspaces = self.workspaces.read().await;
            workspaces.get(&workspace_id).cloned()
        };

        let Some(sender) = sender else {
            debug!(workspace_id = %workspace_id, event_type, "no subscribers for event");
            return;
        };

        match sender.send(Arc::new(envelope)) {
            Ok(receivers) => {
                debug!(workspace_id = %workspace_id, event_type, receivers, "published event")
            }
            Err(_) => {
                // Every receiver is gone; drop the sender so the map does not grow.
                let mut workspaces = self.workspaces.write().await;
                if workspaces
                    .get(&workspace_id)
                    .is_some_and(|s| s.receiver_count() == 0)
                {
                    workspaces.remove(&workspace_id);
                }
            }
        }
    }

    /// Forget a workspace's broadcaster; receivers see the channel close.
    pub async fn close(&self, workspace_id: &str) {
        self.workspaces.write().await.remove(workspace_id);
    }

    pub async fn subscriber_count(&self, workspace_id: &str) -> usize {
        self.workspaces
            .read()
            .await
            .get(workspace_id)
            .map_or(0, |sender| sender.receiver_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkspaceEvent;

    fn deleted(message_id: &str) -> EventEnvelope {
        EventEnvelope::broadcast(
            "w1",
            WorkspaceEvent::MessageDeleted {
                message_id: message_id.into(),
            },
        )
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = EventHub::new();
        let mut receiver = hub.subscribe("w1").await;

        hub.publish(deleted("m1")).await;

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.event.event_type_name(), "message_deleted");
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_a_no_op() {
        let hub = EventHub::new();
        hub.publish(deleted("m1")).await;
        assert_eq!(hub.subscriber_count("w1").await, 0);

        let receiver = hub.subscribe("w1").await;
        drop(receiver);
        hub.publish(deleted("m2")).await;
        assert_eq!(hub.subscriber_count("w1").await, 0);
    }

    #[tokio::test]
    async fn closing_ends_the_stream() {
        let hub = EventHub::new();
        let mut receiver = hub.subscribe("w1").await;
        hub.close("w1").await;
        assert!(matches!(
            receiver.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
