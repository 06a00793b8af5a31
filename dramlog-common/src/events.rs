//! Event types and in-process event bus
//!
//! Events are emitted only after the database work they describe has
//! committed. Delivery is best-effort: a lagging or absent subscriber never
//! affects the request that produced the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Progress on one badge caused by a tasting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardProgress {
    pub badge_id: i64,
    pub badge_name: String,
    pub xp: i64,
    pub level: i64,
    /// Level before this tasting (0 when the award is new)
    pub prev_level: i64,
}

impl AwardProgress {
    /// True when this tasting moved the award to a new level
    pub fn leveled_up(&self) -> bool {
        self.level > self.prev_level
    }
}

/// dramlog event types
///
/// Serialized with a `type` tag for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum DramlogEvent {
    /// A tasting was committed along with its counters, tags and awards
    TastingCreated {
        tasting_id: i64,
        bottle_id: i64,
        user_id: i64,
        awards: Vec<AwardProgress>,
        timestamp: DateTime<Utc>,
    },

    /// A scraper batch of store prices was committed
    StorePricesUpdated {
        store_id: i64,
        prices_updated: usize,
        timestamp: DateTime<Utc>,
    },
}

impl DramlogEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            DramlogEvent::TastingCreated { .. } => "TastingCreated",
            DramlogEvent::StorePricesUpdated { .. } => "StorePricesUpdated",
        }
    }
}

/// Broadcast bus shared by request handlers and subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DramlogEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before slow subscribers
    /// start missing the oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DramlogEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DramlogEvent,
    ) -> Result<usize, broadcast::error::SendError<DramlogEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DramlogEvent) {
        let _ = self.emit(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
