//! Shared event bus
//!
//! Thread-safe broadcast of queue events to SSE listeners.

use tokio::sync::broadcast;
use ytq_common::events::QueueEvent;

/// Buffered events per subscriber before it starts lagging
const EVENT_BUFFER: usize = 100;

/// Shared state accessible by all components
pub struct SharedState {
    /// Event broadcaster for SSE events
    pub event_tx: broadcast::Sender<QueueEvent>,
}

impl SharedState {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { event_tx }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: QueueEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<QueueEvent> {
        self.event_tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.event_tx.receiver_count()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ytq_common::events::QueueChangeTrigger;

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();
        assert_eq!(state.subscriber_count(), 1);

        state.broadcast_event(QueueEvent::QueueChanged {
            trigger: QueueChangeTrigger::HostClear,
            pending_count: 0,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "QueueChanged");
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ok() {
        let state = SharedState::new();
        state.broadcast_event(QueueEvent::CurrentChanged {
            current: None,
            timestamp: Utc::now(),
        });
    }
}
