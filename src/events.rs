//! Engine change notifications
//!
//! The host owns an [`EventBus`] and passes clones wherever events are
//! produced or consumed. Nothing here is global, and the engine itself never
//! publishes: callers decide which operations are worth announcing.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{DuplicateCluster, SavedQuery, Timestamp};

/// Default channel capacity; slow subscribers lag past this many events
pub const DEFAULT_CAPACITY: usize = 256;

/// Kinds of engine events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RecordsRefreshed,
    SearchExecuted,
    SavedQueryCreated,
    SavedQueryDeleted,
    DuplicatesDetected,
}

/// A single event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Host-supplied time of the event, in epoch milliseconds
    pub at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl EngineEvent {
    pub fn records_refreshed(count: usize, at: Timestamp) -> Self {
        Self {
            event_type: EventType::RecordsRefreshed,
            at,
            data: Some(serde_json::json!({ "count": count })),
        }
    }

    /// A search finished; `query` is the raw text, `total` the match count
    pub fn search_executed(query: Option<&str>, total: usize, at: Timestamp) -> Self {
        Self {
            event_type: EventType::SearchExecuted,
            at,
            data: Some(serde_json::json!({
                "query": query,
                "total": total,
            })),
        }
    }

    pub fn saved_query_created(saved: &SavedQuery, at: Timestamp) -> Self {
        Self {
            event_type: EventType::SavedQueryCreated,
            at,
            data: Some(serde_json::json!({
                "id": saved.id,
                "name": saved.name,
            })),
        }
    }

    pub fn saved_query_deleted(id: &str, at: Timestamp) -> Self {
        Self {
            event_type: EventType::SavedQueryDeleted,
            at,
            data: Some(serde_json::json!({ "id": id })),
        }
    }

    pub fn duplicates_detected(clusters: &[DuplicateCluster], at: Timestamp) -> Self {
        let heads: Vec<&str> = clusters.iter().map(|c| c.head.id.as_str()).collect();
        Self {
            event_type: EventType::DuplicatesDetected,
            at,
            data: Some(serde_json::json!({
                "clusters": clusters.len(),
                "heads": heads,
            })),
        }
    }
}

/// Subscription filter; `None` accepts every event type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    pub event_types: Option<Vec<EventType>>,
}

impl EventFilter {
    pub fn only(types: impl IntoIterator<Item = EventType>) -> Self {
        Self {
            event_types: Some(types.into_iter().collect()),
        }
    }

    pub fn matches(&self, event: &EngineEvent) -> bool {
        match &self.event_types {
            Some(types) => types.contains(&event.event_type),
            None => true,
        }
    }
}

/// Broadcast hub for [`EngineEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send to every live subscriber. Returns how many received it; zero
    /// subscribers is not an error.
    pub fn publish(&self, event: EngineEvent) -> usize {
        tracing::trace!(event_type = ?event.event_type, at = event.at, "publish");
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        self.subscribe_filtered(EventFilter::default())
    }

    pub fn subscribe_filtered(&self, filter: EventFilter) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of an [`EventBus`] with its filter applied
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<EngineEvent>,
    filter: EventFilter,
}

impl Subscription {
    /// Next matching event, or `None` once every bus handle is dropped.
    /// Events lost to lag are skipped with a warning.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<EngineEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(EngineEvent::records_refreshed(3, 10)), 0);
    }

    #[tokio::test]
    async fn test_filtered_subscription() {
        let bus = EventBus::new();
        let mut all = bus.subscribe();
        let mut searches = bus.subscribe_filtered(EventFilter::only([EventType::SearchExecuted]));
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(EngineEvent::records_refreshed(3, 10));
        bus.publish(EngineEvent::search_executed(Some("meeting"), 2, 11));

        assert_eq!(all.recv().await.unwrap().event_type, EventType::RecordsRefreshed);
        assert_eq!(all.recv().await.unwrap().event_type, EventType::SearchExecuted);

        let event = searches.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::SearchExecuted);
        assert_eq!(event.at, 11);
        assert_eq!(event.data.unwrap()["total"], 2);
        assert!(searches.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_closed_bus_ends_subscription() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.publish(EngineEvent::saved_query_deleted("q1", 5));
        drop(bus);

        assert!(sub.recv().await.is_some());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_latest() {
        let bus = EventBus::with_capacity(2);
        let mut sub = bus.subscribe();
        for at in 0..5 {
            bus.publish(EngineEvent::records_refreshed(0, at));
        }
        assert_eq!(sub.recv().await.unwrap().at, 3);
        assert_eq!(sub.recv().await.unwrap().at, 4);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(EngineEvent::saved_query_deleted("q1", 5)).unwrap();
        assert_eq!(json["type"], "saved_query_deleted");
        assert_eq!(json["at"], 5);
    }
}
