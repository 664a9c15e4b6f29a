//! Shared test support: a scriptable in-memory RosterSource
//!
//! Lets tests control snapshots, member lookup latency, and failure
//! injection without a real database.

use crew_common::model::Member;
use crew_hub::error::{Error, Result};
use crew_hub::store::{ChangeNotice, RawDocument, RosterSource, GROUPS_COLLECTION};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Scriptable document source for roster tests
#[derive(Clone)]
pub struct ScriptedSource {
    inner: Arc<Inner>,
}

struct Inner {
    // Option so tests can drop the sender to simulate stream termination
    changes: Mutex<Option<broadcast::Sender<ChangeNotice>>>,
    groups: Mutex<Vec<RawDocument>>,
    users: Mutex<HashMap<String, Member>>,
    member_delay: Mutex<Duration>,
    fail_list: AtomicBool,
    failing_ids: Mutex<HashSet<String>>,
    batch_sizes: Mutex<Vec<usize>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Inner {
                changes: Mutex::new(Some(tx)),
                groups: Mutex::new(Vec::new()),
                users: Mutex::new(HashMap::new()),
                member_delay: Mutex::new(Duration::ZERO),
                fail_list: AtomicBool::new(false),
                failing_ids: Mutex::new(HashSet::new()),
                batch_sizes: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn set_groups(&self, docs: Vec<RawDocument>) {
        *self.inner.groups.lock().unwrap() = docs;
    }

    pub fn add_user(&self, id: &str, name: &str) {
        self.inner.users.lock().unwrap().insert(
            id.to_string(),
            Member {
                id: id.to_string(),
                name: name.to_string(),
                profile_picture: None,
            },
        );
    }

    /// Delay applied to every member lookup batch
    pub fn set_member_delay(&self, delay: Duration) {
        *self.inner.member_delay.lock().unwrap() = delay;
    }

    /// Make every `list_groups` call fail
    pub fn fail_list_groups(&self) {
        self.inner.fail_list.store(true, Ordering::SeqCst);
    }

    /// Make any batch containing this id fail
    pub fn fail_member_id(&self, id: &str) {
        self.inner.failing_ids.lock().unwrap().insert(id.to_string());
    }

    /// Emit a study-group change notification
    pub fn notify_groups(&self) {
        if let Some(tx) = self.inner.changes.lock().unwrap().as_ref() {
            let _ = tx.send(ChangeNotice {
                collection: GROUPS_COLLECTION.to_string(),
            });
        }
    }

    /// Emit a change notification for an unrelated collection
    pub fn notify_collection(&self, collection: &str) {
        if let Some(tx) = self.inner.changes.lock().unwrap().as_ref() {
            let _ = tx.send(ChangeNotice {
                collection: collection.to_string(),
            });
        }
    }

    /// Drop the change sender; subscribed receivers observe stream closure
    pub fn close_changes(&self) {
        self.inner.changes.lock().unwrap().take();
    }

    /// Sizes of every member lookup batch issued so far
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.inner.batch_sizes.lock().unwrap().clone()
    }
}

impl RosterSource for ScriptedSource {
    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeNotice> {
        self.inner
            .changes
            .lock()
            .unwrap()
            .as_ref()
            .expect("change stream already closed")
            .subscribe()
    }

    async fn list_groups(&self) -> Result<Vec<RawDocument>> {
        if self.inner.fail_list.load(Ordering::SeqCst) {
            return Err(Error::Internal("scripted snapshot read failure".to_string()));
        }
        Ok(self.inner.groups.lock().unwrap().clone())
    }

    async fn members_by_ids(&self, ids: Vec<String>) -> Result<Vec<Member>> {
        let delay = *self.inner.member_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.inner.batch_sizes.lock().unwrap().push(ids.len());

        {
            let failing = self.inner.failing_ids.lock().unwrap();
            if ids.iter().any(|id| failing.contains(id)) {
                return Err(Error::Internal("scripted member fetch failure".to_string()));
            }
        }

        let users = self.inner.users.lock().unwrap();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

/// Build a study group document with valid array-encoded coordinates
pub fn group_doc(id: &str, title: &str, member_ids: &[&str]) -> RawDocument {
    RawDocument {
        id: id.to_string(),
        data: json!({
            "title": title,
            "subject": "math",
            "mood": "focused",
            "time": "2:00 PM",
            "location": "Mason Hall",
            "description": "test group",
            "memberCount": member_ids.len(),
            "users": member_ids,
            "coordinates": [-83.73, 42.27],
        }),
    }
}

/// Build a study group document with the given coordinate payload
pub fn group_doc_with_coords(id: &str, coordinates: serde_json::Value) -> RawDocument {
    RawDocument {
        id: id.to_string(),
        data: json!({
            "title": format!("group {id}"),
            "subject": "science",
            "mood": "casual",
            "time": "4:00 PM",
            "location": "Chemistry Building",
            "description": "test group",
            "memberCount": 0,
            "users": [],
            "coordinates": coordinates,
        }),
    }
}
