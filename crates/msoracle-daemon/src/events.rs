//! Event emission system.
//!
//! Events drained from the directory after each call are broadcast to every
//! subscribed connection as JSON-RPC notifications. Each subscriber has an
//! independent buffer of `daemon.event_buffer` events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use msoracle_types::events::OracleEvent;
use msoracle_types::OracleId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// An event emitted by the daemon.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Position in the daemon's event stream, starting at 1.
    pub sequence: u64,
    /// Unix timestamp.
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: OracleEvent,
}

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Only events concerning these oracles. Directory-wide events always
    /// pass.
    #[serde(default)]
    pub oracles: Option<Vec<OracleId>>,
    /// Only these `event_type`s, e.g. `"provided"`.
    #[serde(default)]
    pub event_types: Option<Vec<String>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamp and emit directory events in order.
    pub fn publish(&self, events: Vec<OracleEvent>) {
        if events.is_empty() {
            return;
        }
        let timestamp = unix_now();
        for event in events {
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            // No subscribers is not an error.
            let _ = self.sender.send(Event {
                sequence,
                timestamp,
                event,
            });
        }
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref types) = self.event_types {
            let event_type = event.event.event_type();
            if !types.iter().any(|t| t == event_type) {
                return false;
            }
        }

        if let (Some(ref oracles), Some(oracle)) = (&self.oracles, event.event.oracle()) {
            if !oracles.contains(&oracle) {
                return false;
            }
        }

        true
    }
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
