//! Event types for the ClassCrew event system
//!
//! Provides the shared `CrewEvent` definitions and the `EventBus` used for
//! process-wide notification fan-out. The hub uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many event broadcasting
//!   (reset signal, SSE feed)
//! - **mpsc channels**: roster delivery to a single consumer
//! - **Shared state** (`Arc<RwLock<T>>`): read-heavy access

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// ClassCrew event types
///
/// Events are broadcast via the EventBus and can be serialized for SSE
/// transmission to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrewEvent {
    /// The published roster changed
    ///
    /// Triggers:
    /// - SSE: refresh roster views
    RosterUpdated {
        /// Number of groups in the published roster
        group_count: usize,
        /// When the roster was published
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The roster subscription failed (change stream error)
    ///
    /// Triggers:
    /// - SSE: surface a visible error state
    RosterError {
        /// Error message
        message: String,
        /// When the failure occurred
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A study group document was created
    GroupCreated {
        /// Store-assigned group identifier
        group_id: String,
        /// When the group was created
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// All stored data was cleared (bulk delete)
    ///
    /// The reset/invalidation signal: every roster subscriber drops its
    /// held roster and rebuilds from the (now empty) backing store.
    DataCleared {
        /// When the clear completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sample data was written to the backing store
    SampleDataSeeded {
        /// Number of user documents written
        users_seeded: usize,
        /// Number of study group documents written
        groups_seeded: usize,
        /// When seeding completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CrewEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            CrewEvent::RosterUpdated { .. } => "RosterUpdated",
            CrewEvent::RosterError { .. } => "RosterError",
            CrewEvent::GroupCreated { .. } => "GroupCreated",
            CrewEvent::DataCleared { .. } => "DataCleared",
            CrewEvent::SampleDataSeeded { .. } => "SampleDataSeeded",
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// Created once at startup and passed explicitly to every component that
/// emits or receives events; there is no ambient singleton.
///
/// # Examples
///
/// ```
/// use crew_common::events::{CrewEvent, EventBus};
/// use std::sync::Arc;
///
/// let event_bus = Arc::new(EventBus::new(256));
///
/// // Subscribe to events
/// let mut rx = event_bus.subscribe();
///
/// // Emit an event
/// event_bus.emit(CrewEvent::DataCleared {
///     timestamp: chrono::Utc::now(),
/// }).ok();
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CrewEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before
    /// old events are dropped (tokio broadcast lag semantics).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CrewEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: CrewEvent) -> Result<usize, broadcast::error::SendError<CrewEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Useful for non-critical notifications where it's acceptable if no
    /// component is currently listening.
    pub fn emit_lossy(&self, event: CrewEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
