use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::registry::SubscriberRegistry;

/// The only values pushed over the live feed. Timer start/stop is recorded
/// in the event log but never broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Event {
    pub action: EventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MatchStart,
    MatchEnd,
}

impl Event {
    pub fn match_start() -> Self {
        Self {
            action: EventKind::MatchStart,
        }
    }

    pub fn match_end() -> Self {
        Self {
            action: EventKind::MatchEnd,
        }
    }
}

/// Sending half of the broadcast queue, held by the control loop.
#[derive(Clone, Debug)]
pub struct Publisher {
    event_tx: mpsc::UnboundedSender<Event>,
}

impl Publisher {
    /// Queues an event for fan-out. Never blocks on subscriber speed.
    pub fn publish(&self, event: Event) {
        if self.event_tx.send(event).is_err() {
            warn!("broadcaster is gone, dropping {event:?}");
        }
    }
}

/// Single-consumer fan-out loop.
///
/// Consumes one published event at a time and offers it to every subscriber
/// registered at that moment. A subscriber whose delivery fails is evicted
/// from the registry; the failure is never surfaced to the publisher.
pub struct Broadcaster {
    event_rx: mpsc::UnboundedReceiver<Event>,
    registry: Arc<SubscriberRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>) -> (Self, Publisher) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_rx, registry }, Publisher { event_tx })
    }

    pub async fn run(mut self) {
        while let Some(event) = self.event_rx.recv().await {
            self.fan_out(event);
        }
        debug!("broadcast queue closed");
    }

    fn fan_out(&self, event: Event) {
        for (id, sender) in self.registry.snapshot() {
            if sender.send(event).is_err() {
                debug!("evicting subscriber {id}: delivery failed");
                self.registry.remove(id);
            }
        }
    }
}
