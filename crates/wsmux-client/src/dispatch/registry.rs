use std::sync::Arc;

use dashmap::DashMap;

use wsmux_core::Payload;

/// Event listener.
pub type MessageFn = Arc<dyn Fn(&Payload) + Send + Sync>;

/// Per-event listener lists.
///
/// Registration order is delivery order; registering the same callback twice
/// delivers twice.
#[derive(Default)]
pub struct ListenerRegistry {
    by_event: DashMap<String, Vec<MessageFn>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            by_event: DashMap::new(),
        }
    }

    pub fn add(&self, event: impl Into<String>, listener: MessageFn) {
        self.by_event.entry(event.into()).or_default().push(listener);
    }

    /// Snapshot of the listeners for `event`, so callers can invoke them
    /// without holding a shard lock.
    pub fn listeners(&self, event: &str) -> Vec<MessageFn> {
        self.by_event
            .get(event)
            .map(|l| l.value().clone())
            .unwrap_or_default()
    }

    pub fn count(&self, event: &str) -> usize {
        self.by_event.get(event).map(|l| l.len()).unwrap_or(0)
    }

    pub fn events(&self) -> Vec<String> {
        self.by_event.iter().map(|e| e.key().clone()).collect()
    }
}
