//! Roster synchronizer
//!
//! Keeps one subscriber's roster continuously synchronized with the backing
//! store. Each change notification triggers a full rebuild: normalize,
//! dedup, coordinate-filter, then concurrent per-group enrichment, with a
//! single publish once everything for that snapshot has settled.
//!
//! Snapshot freshness is guarded by a monotonic token rather than by
//! cancelling in-flight work: enrichment for a superseded snapshot runs to
//! completion and its result is discarded at publish time.

use crate::error::{Error, Result};
use crate::roster::{enrich, normalize};
use crate::store::{RosterSource, GROUPS_COLLECTION};
use crew_common::events::{CrewEvent, EventBus};
use crew_common::model::StudyGroup;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Messages delivered to a roster subscriber
#[derive(Debug)]
pub enum RosterMessage {
    /// A complete, enriched, validated roster snapshot
    Roster(Vec<StudyGroup>),
    /// The subscription failed; no further rosters will be published
    Error(Error),
}

/// Publish guard for one subscription
///
/// `begin` hands out a monotonically increasing token per snapshot;
/// `try_publish` runs the publish closure only when the token is still the
/// freshest one, at most once per token, and never after `close`. The
/// compare and the publish happen under one lock so a stale snapshot can
/// never overwrite a fresher one.
pub(crate) struct SnapshotGate {
    latest: AtomicU64,
    inner: Mutex<GateInner>,
}

struct GateInner {
    published: u64,
    closed: bool,
}

impl SnapshotGate {
    pub(crate) fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
            inner: Mutex::new(GateInner {
                published: 0,
                closed: false,
            }),
        }
    }

    /// Claim the next snapshot token. Any earlier token is now superseded.
    pub(crate) fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Stop all future publishes, including in-flight enrichment results.
    pub(crate) fn close(&self) {
        self.lock().closed = true;
    }

    /// Run `publish` if `token` is still current. Returns whether it ran.
    pub(crate) fn try_publish(&self, token: u64, publish: impl FnOnce()) -> bool {
        let mut inner = self.lock();
        if inner.closed || token < self.latest.load(Ordering::SeqCst) || token <= inner.published {
            return false;
        }
        inner.published = token;
        publish();
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateInner> {
        // A panic while holding this lock is already a bug in this module;
        // recover the guard rather than cascading.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Handle for one live roster subscription
///
/// Dropping it (or calling [`unsubscribe`](Self::unsubscribe)) closes the
/// publish gate first, so no message (including from enrichment still in
/// flight) reaches the receiver afterwards, then stops the sync task.
pub struct RosterSubscription {
    gate: Arc<SnapshotGate>,
    task: JoinHandle<()>,
}

impl RosterSubscription {
    /// Tear down the subscription. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for RosterSubscription {
    fn drop(&mut self) {
        self.gate.close();
        self.task.abort();
    }
}

/// Factory for live roster subscriptions over a document store
pub struct RosterSynchronizer<S: RosterSource> {
    source: S,
    bus: Arc<EventBus>,
}

impl<S: RosterSource> RosterSynchronizer<S> {
    pub fn new(source: S, bus: Arc<EventBus>) -> Self {
        Self { source, bus }
    }

    /// Start a subscription: an initial snapshot is built immediately, then
    /// one rebuild per store change notification. Roster and error delivery
    /// happen on the returned channel; after a [`RosterMessage::Error`] the
    /// subscription is dead and publishes nothing further.
    pub fn subscribe(&self) -> (RosterSubscription, mpsc::UnboundedReceiver<RosterMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gate = Arc::new(SnapshotGate::new());

        let source = self.source.clone();
        let mut changes = source.subscribe_changes();
        let mut bus_rx = self.bus.subscribe();

        let task_gate = gate.clone();
        let task = tokio::spawn(async move {
            // Initial snapshot before any change arrives
            if !rebuild(&source, &task_gate, &tx).await {
                return;
            }

            // Cleared once the bus sender is gone, so the select stops
            // polling a receiver that would resolve Closed immediately
            // forever.
            let mut bus_open = true;

            loop {
                tokio::select! {
                    notice = changes.recv() => match notice {
                        Ok(notice) if notice.collection == GROUPS_COLLECTION => {
                            if !rebuild(&source, &task_gate, &tx).await {
                                break;
                            }
                        }
                        Ok(_) => {} // other collections don't affect the roster
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "change stream lagged, rebuilding roster");
                            if !rebuild(&source, &task_gate, &tx).await {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => {
                            let token = task_gate.begin();
                            task_gate.try_publish(token, || {
                                let _ = tx.send(RosterMessage::Error(Error::StreamClosed(
                                    "backing store change stream terminated".to_string(),
                                )));
                            });
                            task_gate.close();
                            break;
                        }
                    },
                    event = bus_rx.recv(), if bus_open => match event {
                        Ok(CrewEvent::DataCleared { .. }) => {
                            // Drop the held roster immediately; the token bump
                            // supersedes any enrichment still in flight.
                            let token = task_gate.begin();
                            task_gate.try_publish(token, || {
                                let _ = tx.send(RosterMessage::Roster(Vec::new()));
                            });
                            if !rebuild(&source, &task_gate, &tx).await {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(_)) => {}
                        // Bus teardown happens at process exit; keep serving
                        // store notifications, but stop polling this branch.
                        Err(RecvError::Closed) => {
                            bus_open = false;
                        }
                    },
                }
            }
        });

        (RosterSubscription { gate, task }, rx)
    }
}

/// Run one snapshot rebuild. Returns `false` when the subscription hit a
/// fatal store failure and must stop.
///
/// The snapshot read happens inline; enrichment runs in a detached task so
/// a newer notification can start (and supersede this snapshot) while
/// lookups are still in flight.
async fn rebuild<S: RosterSource>(
    source: &S,
    gate: &Arc<SnapshotGate>,
    tx: &mpsc::UnboundedSender<RosterMessage>,
) -> bool {
    let token = gate.begin();

    let docs = match source.list_groups().await {
        Ok(docs) => docs,
        Err(e) => {
            error!(error = %e, "study group snapshot read failed");
            gate.try_publish(token, || {
                let _ = tx.send(RosterMessage::Error(e));
            });
            gate.close();
            return false;
        }
    };

    let groups = normalize::normalize_snapshot(&docs);

    let source = source.clone();
    let gate = gate.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let roster = enrich::enrich_snapshot(&source, groups).await;
        let published = gate.try_publish(token, || {
            let _ = tx.send(RosterMessage::Roster(roster));
        });
        if !published {
            debug!(token, "discarded superseded roster snapshot");
        }
    });

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_tokens_are_monotonic() {
        let gate = SnapshotGate::new();
        assert_eq!(gate.begin(), 1);
        assert_eq!(gate.begin(), 2);
        assert_eq!(gate.begin(), 3);
    }

    #[test]
    fn test_gate_publishes_current_token() {
        let gate = SnapshotGate::new();
        let token = gate.begin();
        let mut published = false;
        assert!(gate.try_publish(token, || published = true));
        assert!(published);
    }

    #[test]
    fn test_gate_rejects_superseded_token() {
        let gate = SnapshotGate::new();
        let old = gate.begin();
        let new = gate.begin();

        // Newer snapshot publishes first
        assert!(gate.try_publish(new, || {}));
        // Slow older snapshot must be discarded
        assert!(!gate.try_publish(old, || panic!("stale publish ran")));
    }

    #[test]
    fn test_gate_rejects_earlier_token_even_before_newer_publishes() {
        let gate = SnapshotGate::new();
        let old = gate.begin();
        let _new = gate.begin();

        // The moment a newer token exists, the older one is dead
        assert!(!gate.try_publish(old, || panic!("stale publish ran")));
    }

    #[test]
    fn test_gate_publishes_at_most_once_per_token() {
        let gate = SnapshotGate::new();
        let token = gate.begin();
        assert!(gate.try_publish(token, || {}));
        assert!(!gate.try_publish(token, || panic!("double publish ran")));
    }

    #[test]
    fn test_gate_close_blocks_everything() {
        let gate = SnapshotGate::new();
        let token = gate.begin();
        gate.close();
        assert!(!gate.try_publish(token, || panic!("publish after close ran")));

        let later = gate.begin();
        assert!(!gate.try_publish(later, || panic!("publish after close ran")));
    }
}
