//! Roster core: normalization, enrichment, live synchronization

pub mod enrich;
pub mod normalize;
pub mod sync;

pub use sync::{RosterMessage, RosterSubscription, RosterSynchronizer};

use crate::state::AppState;
use crew_common::events::CrewEvent;
use tracing::{error, info};

/// Spawn the hub's own roster subscription.
///
/// Drains one synchronizer subscription into [`AppState`] so HTTP reads see
/// the latest published roster, re-emitting `RosterUpdated`/`RosterError`
/// on the bus for SSE clients. The returned handle must stay alive for the
/// lifetime of the service.
pub fn spawn_roster_hub(state: AppState) -> RosterSubscription {
    let synchronizer = RosterSynchronizer::new(state.store.clone(), state.bus.clone());
    let (subscription, mut rx) = synchronizer.subscribe();

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                RosterMessage::Roster(groups) => {
                    info!("Roster updated: {} groups", groups.len());
                    state.bus.emit_lossy(CrewEvent::RosterUpdated {
                        group_count: groups.len(),
                        timestamp: chrono::Utc::now(),
                    });
                    state.set_roster(groups).await;
                }
                RosterMessage::Error(e) => {
                    error!(error = %e, "roster subscription failed");
                    state.bus.emit_lossy(CrewEvent::RosterError {
                        message: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                }
            }
        }
    });

    subscription
}
