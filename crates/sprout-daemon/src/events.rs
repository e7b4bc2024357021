//! Event emission system.
//!
//! Events are pushed from the daemon to UI subscribers via JSON-RPC
//! notifications. Each subscriber has an independent buffer with
//! backpressure at the configured capacity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// An event emitted by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type name (e.g. "MissionCompleted", "LevelUp").
    pub event_type: String,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Type-specific payload.
    pub payload: serde_json::Value,
}

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category filter: "missions", "progression", "system".
    pub categories: Option<Vec<String>>,
    /// Filter to specific user ids.
    pub user_ids: Option<Vec<i64>>,
}

/// One registered subscription: the events buffered for it and the
/// filter applied when they are polled.
pub struct EventSubscription {
    pub filter: EventFilter,
    pub receiver: broadcast::Receiver<Event>,
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
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref categories) = self.categories {
            let event_category = categorize_event(&event.event_type);
            if !categories.contains(&event_category) {
                return false;
            }
        }

        if let Some(ref user_ids) = self.user_ids {
            if let Some(uid) = event.payload.get("user_id").and_then(|v| v.as_i64()) {
                if !user_ids.contains(&uid) {
                    return false;
                }
            }
        }

        true
    }
}

/// Categorize an event type into a category.
fn categorize_event(event_type: &str) -> String {
    match event_type {
        s if s.starts_with("Mission") || s.starts_with("Pool") => "missions".to_string(),
        s if s.starts_with("Level")
            || s.starts_with("Badge")
            || s.starts_with("Rank")
            || s.starts_with("Streak") =>
        {
            "progression".to_string()
        }
        _ => "system".to_string(),
    }
}
