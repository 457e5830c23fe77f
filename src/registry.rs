use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::broadcast::Event;

pub type SubscriberId = Uuid;

/// Live subscriber handles for the event feed.
///
/// Shared between the WebSocket layer, which adds a handle on connect and
/// removes it on disconnect, and the broadcaster, which removes a handle when
/// delivery to it fails. All access goes through the inner lock; removing an
/// id that is already gone is a no-op.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::UnboundedSender<Event>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: SubscriberId, sender: mpsc::UnboundedSender<Event>) {
        self.subscribers.lock().unwrap().insert(id, sender);
    }

    pub fn remove(&self, id: SubscriberId) {
        self.subscribers.lock().unwrap().remove(&id);
    }

    /// Copied membership at this moment, never the live map.
    pub fn snapshot(&self) -> Vec<(SubscriberId, mpsc::UnboundedSender<Event>)> {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove() {
        let registry = SubscriberRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        registry.add(id, tx);
        assert_eq!(registry.len(), 1);

        registry.remove(id);
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_remove_is_noop() {
        let registry = SubscriberRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        registry.add(id, tx);
        registry.remove(id);
        registry.remove(id);
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_detached() {
        let registry = SubscriberRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        registry.add(id, tx);

        let snapshot = registry.snapshot();
        registry.remove(id);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, id);
        assert!(registry.is_empty());
    }
}
