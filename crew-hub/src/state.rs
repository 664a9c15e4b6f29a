//! Shared application state
//!
//! Thread-safe state shared by the HTTP handlers, the roster hub task, and
//! admin operations. The roster is owned exclusively by the hub task; HTTP
//! reads take a clone through the RwLock.

use crate::store::SqliteStore;
use crew_common::events::EventBus;
use crew_common::model::StudyGroup;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared across handlers and background tasks
#[derive(Clone)]
pub struct AppState {
    /// Backing document store
    pub store: SqliteStore,
    /// Process-wide event bus (reset signal, SSE feed)
    pub bus: Arc<EventBus>,
    /// Latest published roster
    roster: Arc<RwLock<Vec<StudyGroup>>>,
}

impl AppState {
    pub fn new(store: SqliteStore, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            bus,
            roster: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Current roster snapshot
    pub async fn roster(&self) -> Vec<StudyGroup> {
        self.roster.read().await.clone()
    }

    /// Replace the held roster (hub task only)
    pub async fn set_roster(&self, groups: Vec<StudyGroup>) {
        *self.roster.write().await = groups;
    }
}
